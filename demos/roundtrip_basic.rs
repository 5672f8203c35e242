//! Example of a full .tbl round trip: bytes → document → XML → document → bytes

use tbledit::{from_xml, to_xml, TblParser, TblWriter};

fn main() -> anyhow::Result<()> {
    println!("=== Table Round-Trip Example ===\n");

    // A small table: signature + tag field, then two tagged groups mixing
    // text, a control pair and a printf specifier.
    let mut raw = Vec::new();
    raw.extend_from_slice(b"\x10\x20ITEM\x00");
    raw.extend_from_slice(b"ITEMAB\x00Potion\x01Heals %d HP\x00");
    raw.extend_from_slice(b"ITEM\x00");

    let tags = vec!["ITEM".to_string()];
    let doc = TblParser::new().parse(&raw, &tags)?;

    println!("Parsed {} groups:", doc.groups.len());
    for (idx, group) in doc.groups.iter().enumerate() {
        println!("  {}) tag={} entries={}", idx, group.tag, group.entries.len());
    }

    // Serialize to the editable XML form
    let xml = to_xml(&doc)?;
    println!("\nXML document:\n---\n{}---", xml);

    // Deserialize and rebuild the binary file
    let edited = from_xml(&xml)?;
    assert_eq!(edited, doc);

    let rebuilt = TblWriter::new().write(&edited)?;
    assert_eq!(rebuilt, raw);

    println!("\nRound-trip verification passed!");

    Ok(())
}
