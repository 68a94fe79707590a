use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Document, Object};

use crate::error::{BankrecError, Result};
use crate::models::{ParsedRow, TextFragment, TokenLine};
use crate::segment::{segment_lines, segment_token_lines};

/// Extract transaction rows from PDF bytes.
///
/// The fast plain-text strategy is attempted first; any failure there
/// (including encrypted documents) falls back to the positional-token
/// strategy, which understands passwords.
pub fn read_pdf(bytes: &[u8], password: Option<&str>) -> Result<Vec<ParsedRow>> {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => {
            let lines: Vec<&str> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            Ok(segment_lines(&lines))
        }
        Err(_) => {
            let token_lines = extract_positioned(bytes, password)?;
            Ok(segment_token_lines(&token_lines))
        }
    }
}

/// Positional-token strategy: decode content streams and recover one
/// [`TokenLine`] per visual row, page by page in document order.
fn extract_positioned(bytes: &[u8], password: Option<&str>) -> Result<Vec<TokenLine>> {
    let mut doc = Document::load_mem(bytes)
        .map_err(|e| BankrecError::MalformedInput(e.to_string()))?;
    if doc.is_encrypted() {
        let password = password.unwrap_or("");
        if password.is_empty() {
            return Err(BankrecError::PasswordRequired);
        }
        doc.decrypt(password)
            .map_err(|_| BankrecError::PasswordIncorrect)?;
    }
    let mut lines = Vec::new();
    for page_id in doc.page_iter() {
        let fragments = page_fragments(&doc, page_id)?;
        lines.extend(group_fragments(fragments));
    }
    Ok(lines)
}

fn operand_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

// PDF strings are either UTF-16BE (BOM-prefixed) or a byte encoding close
// enough to Latin-1 for the date/amount/description heuristics downstream.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Walk a page's content stream tracking the text-positioning operators and
/// emit one fragment per shown string, positioned at its line origin.
fn page_fragments(doc: &Document, page_id: (u32, u16)) -> Result<Vec<TextFragment>> {
    let content: Content = doc
        .get_and_decode_page_content(page_id)
        .map_err(|e| BankrecError::Extraction(e.to_string()))?;

    let mut fragments = Vec::new();
    let (mut x, mut y) = (0.0_f64, 0.0_f64);
    let mut leading = 0.0_f64;

    let mut push = |text: String, x: f64, y: f64| {
        if !text.trim().is_empty() {
            fragments.push(TextFragment { text, x, y });
        }
    };

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                x = 0.0;
                y = 0.0;
            }
            "Tm" => {
                if operands.len() >= 6 {
                    x = operand_number(&operands[4]).unwrap_or(0.0);
                    y = operand_number(&operands[5]).unwrap_or(0.0);
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    x += operand_number(&operands[0]).unwrap_or(0.0);
                    y += operand_number(&operands[1]).unwrap_or(0.0);
                }
            }
            "TD" => {
                if operands.len() >= 2 {
                    let dy = operand_number(&operands[1]).unwrap_or(0.0);
                    leading = -dy;
                    x += operand_number(&operands[0]).unwrap_or(0.0);
                    y += dy;
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(operand_number) {
                    leading = l;
                }
            }
            "T*" => {
                y -= leading;
            }
            "Tj" => {
                if let Some(Object::String(s, _)) = operands.first() {
                    push(decode_pdf_string(s), x, y);
                }
            }
            "'" | "\"" => {
                y -= leading;
                if let Some(Object::String(s, _)) = operands.last() {
                    push(decode_pdf_string(s), x, y);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text: String = items
                        .iter()
                        .filter_map(|item| match item {
                            Object::String(s, _) => Some(decode_pdf_string(s)),
                            _ => None,
                        })
                        .collect();
                    push(text, x, y);
                }
            }
            _ => {}
        }
    }
    Ok(fragments)
}

/// Group fragments into visual rows: bucket by integer-rounded baseline
/// (absorbing sub-pixel jitter), order each bucket left to right, and emit
/// buckets in ascending vertical order.
pub fn group_fragments(fragments: Vec<TextFragment>) -> Vec<TokenLine> {
    let mut buckets: BTreeMap<i64, Vec<TextFragment>> = BTreeMap::new();
    for fragment in fragments {
        let key = fragment.y.round() as i64;
        buckets.entry(key).or_default().push(fragment);
    }
    buckets
        .into_iter()
        .map(|(y, mut fragments)| {
            fragments.sort_by(|a, b| a.x.total_cmp(&b.x));
            TokenLine { y, fragments }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream, StringFormat};

    fn fragment(text: &str, x: f64, y: f64) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn test_group_fragments_buckets_by_rounded_baseline() {
        // 99.7 and 100.2 round into the same visual row.
        let lines = group_fragments(vec![
            fragment("STORE", 80.0, 99.7),
            fragment("01.03.2024", 10.0, 100.2),
            fragment("45.20", 400.0, 100.0),
        ]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "01.03.2024 STORE 45.20");
    }

    #[test]
    fn test_group_fragments_orders_rows_by_ascending_y() {
        let lines = group_fragments(vec![
            fragment("second", 0.0, 200.0),
            fragment("first", 0.0, 100.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "first");
        assert_eq!(lines[1].text(), "second");
    }

    #[test]
    fn test_group_fragments_orders_within_row_by_x() {
        let lines = group_fragments(vec![
            fragment("b", 50.0, 10.0),
            fragment("c", 90.0, 10.0),
            fragment("a", 5.0, 10.0),
        ]);
        assert_eq!(lines[0].text(), "a b c");
    }

    fn minimal_pdf(text_line: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text_line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    // A document whose trailer declares standard security with handler
    // entries no password can satisfy.
    fn encrypted_pdf() -> Vec<u8> {
        let mut doc = Document::load_mem(&minimal_pdf("01.03.2024 CARD 10.00")).unwrap();
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "O" => Object::String(vec![0u8; 32], StringFormat::Hexadecimal),
            "U" => Object::String(vec![0u8; 32], StringFormat::Hexadecimal),
            "P" => -1,
        });
        doc.trailer.set("Encrypt", encrypt_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_read_pdf_extracts_transaction_rows() {
        let bytes = minimal_pdf("01.03.2024 GROCERY STORE 45.20");
        let rows = read_pdf(&bytes, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "01.03.2024");
        assert!(rows[0].description.contains("GROCERY"));
        assert!(rows[0].description.contains("STORE"));
        assert_eq!(rows[0].amount, 45.2);
    }

    #[test]
    fn test_encrypted_without_password_requires_password() {
        let err = extract_positioned(&encrypted_pdf(), None).unwrap_err();
        assert!(matches!(err, BankrecError::PasswordRequired));
    }

    #[test]
    fn test_encrypted_with_empty_password_requires_password() {
        let err = extract_positioned(&encrypted_pdf(), Some("")).unwrap_err();
        assert!(matches!(err, BankrecError::PasswordRequired));
    }

    #[test]
    fn test_encrypted_with_wrong_password_is_rejected() {
        let err = extract_positioned(&encrypted_pdf(), Some("wrong")).unwrap_err();
        assert!(matches!(err, BankrecError::PasswordIncorrect));
    }

    #[test]
    fn test_decode_pdf_string_utf16() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42];
        assert_eq!(decode_pdf_string(&bytes), "AB");
    }

    #[test]
    fn test_decode_pdf_string_byte_encoding() {
        assert_eq!(decode_pdf_string(b"KAUFLAND 45.20"), "KAUFLAND 45.20");
    }
}
