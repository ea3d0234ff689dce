//! Spreadsheet export.
//!
//! Rows are first built into plain `Sheet` values, then written to an xlsx
//! workbook in memory. The HTTP layer only sees the finished `ExportFile`.

use chrono::{DateTime, FixedOffset, Utc};
use rust_xlsxwriter::{Format, Workbook};

use crate::errors::AppError;
use crate::models::{validation::format_phone, CampaignStatus, CampaignSummary, ContactWithDetails};

/// MIME type of the generated workbooks.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";
const FILENAME_STAMP: &str = "%Y-%m-%d_%H-%M";
const MISSING: &str = "N/A";

const CONTACT_HEADERS: &[&str] = &[
    "Data/Hora da Coleta",
    "Campanha",
    "Local",
    "Coletador",
    "Bairro",
    "Nome",
    "Telefone",
    "Demanda",
];
const CONTACT_WIDTHS: &[f64] = &[20.0, 25.0, 25.0, 20.0, 20.0, 15.0, 15.0, 40.0];

const CAMPAIGN_CONTACT_HEADERS: &[&str] = &[
    "Data/Hora da Coleta",
    "Coletador",
    "Bairro",
    "Nome",
    "Telefone",
    "Demanda",
];
const CAMPAIGN_CONTACT_WIDTHS: &[f64] = &[20.0, 20.0, 20.0, 15.0, 15.0, 40.0];

const SUMMARY_HEADERS: &[&str] = &["Métrica", "Valor"];
const SUMMARY_WIDTHS: &[f64] = &[25.0, 15.0];

const CAMPAIGN_HEADERS: &[&str] = &[
    "Nome",
    "Local",
    "Data Início",
    "Data Fim",
    "Status",
    "Participantes",
    "Contatos Coletados",
];
const CAMPAIGN_WIDTHS: &[f64] = &[25.0, 25.0, 20.0, 20.0, 12.0, 15.0, 18.0];

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn count(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

/// One worksheet: a bold header row followed by data rows.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub widths: &'static [f64],
    pub rows: Vec<Vec<Cell>>,
}

/// A generated workbook ready to be sent as an attachment.
#[derive(Debug)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Contact rows written, headers excluded.
    pub rows: usize,
}

/// All contacts in one sheet.
pub fn export_contacts(
    contacts: &[ContactWithDetails],
    at: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<ExportFile, AppError> {
    let sheet = contacts_sheet("Contatos Coletados", contacts, offset);

    Ok(ExportFile {
        filename: format!("contatos_{}.xlsx", stamp(at, offset)),
        rows: sheet.rows.len(),
        bytes: write_workbook(&[sheet])?,
    })
}

/// Contacts of one campaign, without the campaign columns.
pub fn export_campaign_contacts(
    campaign_name: &str,
    contacts: &[ContactWithDetails],
    at: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<ExportFile, AppError> {
    let sheet = campaign_contacts_sheet(contacts, offset);

    Ok(ExportFile {
        filename: format!(
            "contatos_{}_{}.xlsx",
            sanitize_filename(campaign_name),
            stamp(at, offset)
        ),
        rows: sheet.rows.len(),
        bytes: write_workbook(&[sheet])?,
    })
}

/// Summary, campaigns and contacts sheets.
pub fn export_all(
    campaigns: &[CampaignSummary],
    contacts: &[ContactWithDetails],
    at: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<ExportFile, AppError> {
    let sheets = [
        summary_sheet(campaigns, contacts.len(), at, offset),
        campaigns_sheet(campaigns, offset),
        contacts_sheet("Contatos", contacts, offset),
    ];

    Ok(ExportFile {
        filename: format!("dados_completos_{}.xlsx", stamp(at, offset)),
        rows: sheets[2].rows.len(),
        bytes: write_workbook(&sheets)?,
    })
}

pub fn contacts_sheet(
    name: &'static str,
    contacts: &[ContactWithDetails],
    offset: FixedOffset,
) -> Sheet {
    let rows = contacts
        .iter()
        .map(|c| {
            vec![
                Cell::text(format_date(c.contact.created_at, offset)),
                Cell::text(or_missing(c.campaign_name.as_deref())),
                Cell::text(or_missing(c.campaign_location.as_deref())),
                Cell::text(or_missing(c.collector_username.as_deref())),
                Cell::text(c.contact.neighborhood.as_str()),
                Cell::text(c.contact.first_name.as_str()),
                Cell::text(format_phone(&c.contact.phone)),
                Cell::text(c.contact.demand.as_deref().unwrap_or_default()),
            ]
        })
        .collect();

    Sheet {
        name,
        headers: CONTACT_HEADERS,
        widths: CONTACT_WIDTHS,
        rows,
    }
}

pub fn campaign_contacts_sheet(contacts: &[ContactWithDetails], offset: FixedOffset) -> Sheet {
    let rows = contacts
        .iter()
        .map(|c| {
            vec![
                Cell::text(format_date(c.contact.created_at, offset)),
                Cell::text(or_missing(c.collector_username.as_deref())),
                Cell::text(c.contact.neighborhood.as_str()),
                Cell::text(c.contact.first_name.as_str()),
                Cell::text(format_phone(&c.contact.phone)),
                Cell::text(c.contact.demand.as_deref().unwrap_or_default()),
            ]
        })
        .collect();

    Sheet {
        name: "Contatos",
        headers: CAMPAIGN_CONTACT_HEADERS,
        widths: CAMPAIGN_CONTACT_WIDTHS,
        rows,
    }
}

pub fn summary_sheet(
    campaigns: &[CampaignSummary],
    contact_total: usize,
    at: DateTime<Utc>,
    offset: FixedOffset,
) -> Sheet {
    let with_status = |status| {
        campaigns
            .iter()
            .filter(|c| c.campaign.status == status)
            .count() as i64
    };

    let rows = vec![
        vec![
            Cell::text("Total de Campanhas"),
            Cell::count(campaigns.len() as i64),
        ],
        vec![
            Cell::text("Campanhas Ativas"),
            Cell::count(with_status(CampaignStatus::Active)),
        ],
        vec![
            Cell::text("Campanhas Finalizadas"),
            Cell::count(with_status(CampaignStatus::Finished)),
        ],
        vec![
            Cell::text("Total de Contatos"),
            Cell::count(contact_total as i64),
        ],
        vec![
            Cell::text("Data de Exportação"),
            Cell::text(format_date(at, offset)),
        ],
    ];

    Sheet {
        name: "Resumo",
        headers: SUMMARY_HEADERS,
        widths: SUMMARY_WIDTHS,
        rows,
    }
}

pub fn campaigns_sheet(campaigns: &[CampaignSummary], offset: FixedOffset) -> Sheet {
    let rows = campaigns
        .iter()
        .map(|s| {
            vec![
                Cell::text(s.campaign.name.as_str()),
                Cell::text(s.campaign.location.as_str()),
                Cell::text(format_date(s.campaign.start_date, offset)),
                Cell::text(format_date(s.campaign.end_date, offset)),
                Cell::text(s.campaign.status.label()),
                Cell::count(s.participant_count),
                Cell::count(s.contact_count),
            ]
        })
        .collect();

    Sheet {
        name: "Campanhas",
        headers: CAMPAIGN_HEADERS,
        widths: CAMPAIGN_WIDTHS,
        rows,
    }
}

/// Render sheets into xlsx bytes.
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;

        for (col, width) in sheet.widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }
        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }

        for (index, row) in sheet.rows.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(text) => worksheet.write_string(row_num, col as u16, text)?,
                    Cell::Number(number) => worksheet.write_number(row_num, col as u16, *number)?,
                };
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Replace everything outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn format_date(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(DATE_FORMAT).to_string()
}

fn stamp(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(FILENAME_STAMP).to_string()
}

fn or_missing(value: Option<&str>) -> &str {
    value.unwrap_or(MISSING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Campaign, Contact};
    use chrono::TimeZone;

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn contact(first_name: &str, demand: Option<&str>, collector: Option<&str>) -> ContactWithDetails {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        ContactWithDetails {
            contact: Contact {
                id: format!("id-{}", first_name),
                campaign_id: "camp-1".into(),
                collector_id: "user-1".into(),
                neighborhood: "Centro".into(),
                first_name: first_name.into(),
                phone: "11987654321".into(),
                demand: demand.map(str::to_string),
                created_at: at,
                updated_at: at,
            },
            campaign_name: Some("Mutirão Centro".into()),
            campaign_location: Some("Praça Central".into()),
            collector_username: collector.map(str::to_string),
        }
    }

    fn summary(name: &str, status: CampaignStatus) -> CampaignSummary {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        CampaignSummary {
            campaign: Campaign {
                id: format!("id-{}", name),
                name: name.into(),
                location: "Praça".into(),
                start_date: at,
                end_date: at + chrono::Duration::hours(6),
                status,
                created_by: "admin".into(),
                created_at: at,
            },
            participant_count: 2,
            contact_count: 5,
        }
    }

    #[test]
    fn test_contacts_sheet_shape() {
        let contacts = vec![
            contact("Maria", Some("Creche"), Some("ana")),
            contact("João", None, None),
            contact("Rita", Some("Asfalto"), Some("bruno")),
        ];
        let sheet = contacts_sheet("Contatos Coletados", &contacts, brt());

        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.headers.len(), sheet.widths.len());
        assert!(sheet.rows.iter().all(|r| r.len() == CONTACT_HEADERS.len()));

        let row = &sheet.rows[1];
        assert_eq!(row[0], Cell::text("01/03/2025 09:30"));
        assert_eq!(row[3], Cell::text("N/A"));
        assert_eq!(row[6], Cell::text("(11) 98765-4321"));
        assert_eq!(row[7], Cell::text(""));
    }

    #[test]
    fn test_campaign_contacts_sheet_omits_campaign_columns() {
        let sheet = campaign_contacts_sheet(&[contact("Maria", Some("Creche"), Some("ana"))], brt());
        assert_eq!(sheet.name, "Contatos");
        assert_eq!(sheet.rows[0].len(), 6);
        assert_eq!(sheet.rows[0][1], Cell::text("ana"));
        assert_eq!(sheet.rows[0][5], Cell::text("Creche"));
    }

    #[test]
    fn test_summary_counts() {
        let campaigns = vec![
            summary("A", CampaignStatus::Active),
            summary("B", CampaignStatus::Finished),
            summary("C", CampaignStatus::Finished),
        ];
        let at = Utc.with_ymd_and_hms(2025, 3, 2, 3, 0, 0).unwrap();
        let sheet = summary_sheet(&campaigns, 7, at, brt());

        assert_eq!(sheet.rows[0][1], Cell::Number(3.0));
        assert_eq!(sheet.rows[1][1], Cell::Number(1.0));
        assert_eq!(sheet.rows[2][1], Cell::Number(2.0));
        assert_eq!(sheet.rows[3][1], Cell::Number(7.0));
        assert_eq!(sheet.rows[4][1], Cell::text("02/03/2025 00:00"));
    }

    #[test]
    fn test_campaigns_sheet_status_labels() {
        let sheet = campaigns_sheet(&[summary("B", CampaignStatus::Finished)], brt());
        assert_eq!(sheet.rows[0][4], Cell::text("Finalizada"));
        assert_eq!(sheet.rows[0][5], Cell::Number(2.0));
        assert_eq!(sheet.rows[0][6], Cell::Number(5.0));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Mutirão Centro-2025"), "Mutir_o_Centro_2025");
        assert_eq!(sanitize_filename("abc123"), "abc123");
    }

    #[test]
    fn test_export_files() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 21, 5, 0).unwrap();
        let contacts = vec![contact("Maria", None, Some("ana"))];

        let file = export_contacts(&contacts, at, brt()).unwrap();
        assert_eq!(file.filename, "contatos_2025-03-01_18-05.xlsx");
        assert!(file.bytes.starts_with(b"PK"));
        assert_eq!(file.rows, 1);

        let file = export_campaign_contacts("Bairro Novo", &contacts, at, brt()).unwrap();
        assert_eq!(file.filename, "contatos_Bairro_Novo_2025-03-01_18-05.xlsx");
        assert_eq!(file.rows, 1);

        let campaigns = vec![summary("A", CampaignStatus::Active)];
        let file = export_all(&campaigns, &contacts, at, brt()).unwrap();
        assert_eq!(file.filename, "dados_completos_2025-03-01_18-05.xlsx");
        assert!(file.bytes.starts_with(b"PK"));
        assert_eq!(file.rows, 1);

        let file = export_contacts(&[], at, brt()).unwrap();
        assert!(file.bytes.starts_with(b"PK"));
        assert_eq!(file.rows, 0);
    }
}
