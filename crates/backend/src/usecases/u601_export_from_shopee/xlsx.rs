use chrono::Utc;
use contracts::usecases::u601_export_from_shopee::DataType;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// Предел ширины колонки в символах
const MAX_COLUMN_WIDTH: usize = 50;

/// Собрать xlsx в память: жирная строка заголовков, все значения
/// строками, ширина колонок по содержимому.
pub fn build_workbook(columns: &[&str], rows: &[Vec<String>]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for (col, name) in columns.iter().enumerate() {
        sheet.write_with_format(0, col as u16, *name, &header_format)?;
    }

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate().take(columns.len()) {
            sheet.write_string((r + 1) as u32, c as u16, value)?;
            let len = value.chars().count();
            if len > widths[c] {
                widths[c] = len;
            }
        }
    }

    for (c, width) in widths.iter().enumerate() {
        sheet.set_column_width(c as u16, ((width + 2).min(MAX_COLUMN_WIDTH)) as f64)?;
    }

    workbook.save_to_buffer()
}

/// Имя файла выгрузки: тип_магазин_времяUTC.xlsx
pub fn export_filename(data_type: DataType, shop_name: &str) -> String {
    format!(
        "{}_{}_{}.xlsx",
        data_type.as_str(),
        sanitize_filename(shop_name),
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}

/// Имя магазина приходит от Shopee и может содержать что угодно —
/// в имени файла остаются только безопасные символы
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "shop".to_string()
    } else {
        cleaned
    }
}
