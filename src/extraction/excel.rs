use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use super::table::Table;
use super::{ExtractionError, FormatHandler};

pub struct ExcelHandler;

impl FormatHandler for ExcelHandler {
    fn label(&self) -> &'static str {
        "Excel"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".xls", ".xlsx"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let sheet_names = workbook.sheet_names().to_vec();
        debug!(sheet_count = sheet_names.len(), "Extracting workbook");

        let mut out = String::new();
        for name in sheet_names {
            let range = workbook.worksheet_range(&name)?;
            out.push_str(&format!("Sheet: {}\n", name));
            out.push_str(&render_sheet(&range));
            out.push_str("\n\n");
        }

        Ok(out)
    }
}

/// First row is the header, the rest are data rows.
fn render_sheet(range: &Range<Data>) -> String {
    let mut rows = range.rows();
    let table = match rows.next() {
        Some(header) => {
            let mut table = Table::with_header(header.iter().map(format_cell));
            for row in rows {
                table.push_row(row.iter().map(format_cell));
            }
            table
        }
        None => Table::default(),
    };
    table.render()
}

fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => cell.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn cell_xml(reference: &str, value: &str) -> String {
        if value.parse::<f64>().is_ok() {
            format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value)
        } else {
            format!(r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#, reference, value)
        }
    }

    fn sheet_xml(rows: &[&[&str]]) -> String {
        let mut body = String::new();
        for (r, row) in rows.iter().enumerate() {
            body.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                let column = (b'A' + c as u8) as char;
                body.push_str(&cell_xml(&format!("{}{}", column, r + 1), value));
            }
            body.push_str("</row>");
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            body
        )
    }

    /// Minimal XLSX package with inline-string cells.
    pub(crate) fn build_xlsx(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut content_types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        let mut workbook_sheets = String::new();
        let mut workbook_rels = String::new();
        for (idx, (name, _)) in sheets.iter().enumerate() {
            let n = idx + 1;
            content_types.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                n
            ));
            workbook_sheets.push_str(&format!(r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#, name, n, n));
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                n, n
            ));
        }
        content_types.push_str("</Types>");

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(content_types.as_bytes()).unwrap();

        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        )
        .unwrap();

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{}</sheets></workbook>"#,
                workbook_sheets
            )
            .as_bytes(),
        )
        .unwrap();

        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                workbook_rels
            )
            .as_bytes(),
        )
        .unwrap();

        for (idx, (_, rows)) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options).unwrap();
            zip.write_all(sheet_xml(rows).as_bytes()).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_sheets_labelled_in_workbook_order() {
        let bytes = build_xlsx(&[
            ("Sheet1", &[&["item", "count"], &["apples", "3"]]),
            ("Data", &[&["region", "sales"], &["north", "1200"], &["south", "950"]]),
        ]);
        let text = ExcelHandler.extract(&bytes).unwrap();

        let first = text.find("Sheet: Sheet1\n").expect("first sheet label");
        let second = text.find("Sheet: Data\n").expect("second sheet label");
        assert!(first < second);

        let sheet1 = &text[first..second];
        for value in ["item", "count", "apples", "3"] {
            assert!(sheet1.contains(value), "missing {} in {}", value, sheet1);
        }
        assert!(sheet1.ends_with("\n\n"));

        let data = &text[second..];
        for value in ["region", "sales", "north", "1200", "south", "950"] {
            assert!(data.contains(value), "missing {} in {}", value, data);
        }
        assert!(data.ends_with("\n\n"));
    }

    #[test]
    fn test_sheet_rendering() {
        let bytes = build_xlsx(&[("Stock", &[&["part", "qty"], &["bolt", "4"]])]);
        let text = ExcelHandler.extract(&bytes).unwrap();
        assert_eq!(text, "Sheet: Stock\n   part  qty\n0  bolt    4\n\n");
    }

    #[test]
    fn test_not_a_workbook() {
        assert!(ExcelHandler.extract(b"definitely not a spreadsheet").is_err());
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&Data::Float(42.0)), "42");
        assert_eq!(format_cell(&Data::Float(2.5)), "2.5");
        assert_eq!(format_cell(&Data::Int(-7)), "-7");
        assert_eq!(format_cell(&Data::Bool(true)), "True");
        assert_eq!(format_cell(&Data::Empty), "");
        assert_eq!(format_cell(&Data::String("x".into())), "x");
    }
}
