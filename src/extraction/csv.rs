use ::csv::ReaderBuilder;

use super::table::Table;
use super::{ExtractionError, FormatHandler};

pub struct CsvHandler;

impl FormatHandler for CsvHandler {
    fn label(&self) -> &'static str {
        "CSV"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".csv"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(ExtractionError::malformed("No columns to parse from file"));
        }

        let mut table = Table::with_header(headers.iter());
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() > headers.len() {
                return Err(ExtractionError::malformed(format!(
                    "Error tokenizing data. Expected {} fields in line {}, saw {}",
                    headers.len(),
                    line + 2,
                    record.len()
                )));
            }
            table.push_row(record.iter());
        }

        Ok(table.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cell_is_rendered() {
        let text = CsvHandler
            .extract(b"city,population,country\nOslo,709037,Norway\nBergen,291940,Norway\n")
            .unwrap();
        for value in ["city", "population", "country", "Oslo", "709037", "Bergen", "291940", "Norway"] {
            assert!(text.contains(value), "missing {} in {}", value, text);
        }
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(2).unwrap().starts_with('1'));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let text = CsvHandler.extract(b"a,b\n1\n").unwrap();
        assert_eq!(text, "   a    b\n0  1  NaN");
    }

    #[test]
    fn test_long_row_is_an_error() {
        let err = CsvHandler.extract(b"a,b\n1,2,3\n").unwrap_err();
        assert_eq!(err.to_string(), "Error tokenizing data. Expected 2 fields in line 2, saw 3");
    }

    #[test]
    fn test_empty_input() {
        let err = CsvHandler.extract(b"").unwrap_err();
        assert_eq!(err.to_string(), "No columns to parse from file");
    }

    #[test]
    fn test_header_only() {
        let text = CsvHandler.extract(b"left,right\n").unwrap();
        assert_eq!(text, "Empty DataFrame\nColumns: [left, right]\nIndex: []");
    }

    #[test]
    fn test_quoted_fields() {
        let text = CsvHandler.extract(b"name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n").unwrap();
        assert!(text.contains("Smith, J"));
        assert!(text.contains("said \"hi\""));
    }
}
