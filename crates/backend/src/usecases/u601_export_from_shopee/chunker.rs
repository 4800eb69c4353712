use chrono::{Duration, NaiveDate};

/// Непрерывный отрезок дат внутри запрошенного периода.
///
/// Списочные эндпоинты Shopee надежно отдают данные только за
/// ограниченное окно, поэтому период режется на чанки и каждый
/// выгружается отдельной пагинацией.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateChunk {
    /// Порядковый номер чанка (нумерация с нуля, используется в чекпоинте)
    pub index: usize,
    /// Первый день чанка (включительно)
    pub date_from: NaiveDate,
    /// Последний день чанка (включительно)
    pub date_to: NaiveDate,
}

impl DateChunk {
    /// Начало чанка как unix-время: 00:00:00 UTC первого дня
    pub fn time_from_unix(&self) -> i64 {
        self.date_from.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
    }

    /// Конец чанка как unix-время: 23:59:59 UTC последнего дня
    pub fn time_to_unix(&self) -> i64 {
        self.date_to.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp()
    }
}

/// Разбить период [date_from, date_to] на чанки шириной не более
/// `chunk_days` дней. Чанки покрывают период без дыр и перекрытий.
pub fn split_date_range(date_from: NaiveDate, date_to: NaiveDate, chunk_days: i64) -> Vec<DateChunk> {
    if date_from > date_to {
        return Vec::new();
    }
    let chunk_days = chunk_days.max(1);

    let mut chunks = Vec::new();
    let mut start = date_from;
    let mut index = 0;
    while start <= date_to {
        let end = (start + Duration::days(chunk_days - 1)).min(date_to);
        chunks.push(DateChunk {
            index,
            date_from: start,
            date_to: end,
        });
        start = end + Duration::days(1);
        index += 1;
    }
    chunks
}
