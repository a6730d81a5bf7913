use chrono::{DateTime, TimeZone, Utc};
use rfax_core::service::{extract_entry_at, extract_entry_from_str_at};

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:A="urn:schemas-autodesk-com:partatom">
  <title>Comfy Chair</title>
  <id>urn:uuid:3c0e10b7-2f3a-4e6e-9f6a-000000000001</id>
  <updated>2021-01-26T07:25:06Z</updated>
  <A:taxonomy>
    <term>adsk:revit</term>
    <label>Autodesk Revit</label>
  </A:taxonomy>
  <A:taxonomy>
    <term>orphan-without-label</term>
  </A:taxonomy>
  <category>
    <term>Möbel</term>
  </category>
  <category/>
  <link rel="design-file" type="application/rfa" href="Comfy%20Chair.rfa">
    <A:design-file>
      <A:title>Comfy Chair.rfa</A:title>
      <A:product>Revit</A:product>
      <A:product-version>2021</A:product-version>
      <A:updated>2020-12-01T09:00:00Z</A:updated>
    </A:design-file>
  </link>
  <link rel="self" type="application/atom+xml" href="entry.xml"/>
  <A:features>
    <A:feature>
      <A:title>Dimensions</A:title>
      <A:group>
        <A:title>Geometry</A:title>
        <Width type="custom">100</Width>
        <Title xmlns="">group child named like a title</Title>
        <A:vendor-extra>skipped in groups</A:vendor-extra>
        <Depth displayName="Seat Depth" type="system" typeOfParameter="Länge" units="millimeter">450</Depth>
      </A:group>
    </A:feature>
  </A:features>
  <A:family type="system">
    <A:variationCount>3</A:variationCount>
    <A:part type="catalog">
      <title>Chair 450mm</title>
      <Title xmlns="">part child named like a title</Title>
      <A:material>Oak</A:material>
      <Height type="custom">450</Height>
    </A:part>
  </A:family>
</entry>"#;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn container(payload: &[u8]) -> Vec<u8> {
    let mut blob = vec![0x00, 0xD0, 0xCF, 0x11, 0xE0];
    blob.extend_from_slice(payload);
    blob.extend_from_slice(&[0x00, 0xFF]);
    blob
}

#[test]
fn extracts_the_full_entity_graph() {
    let blob = container(SAMPLE.as_bytes());
    let extraction = extract_entry_at(&blob, fixed_now()).unwrap();
    let entry = &extraction.entry;

    assert_eq!(entry.name, "Comfy Chair");
    assert_eq!(entry.id, "urn:uuid:3c0e10b7-2f3a-4e6e-9f6a-000000000001");
    assert_eq!(entry.updated, Utc.with_ymd_and_hms(2021, 1, 26, 7, 25, 6).unwrap());

    // only the taxonomy with both term and label survives
    assert_eq!(entry.taxonomies.len(), 1);
    assert_eq!(entry.taxonomies[0].term, "adsk:revit");
    assert_eq!(entry.taxonomies[0].label, "Autodesk Revit");

    assert_eq!(entry.categories.len(), 2);
    assert_eq!(entry.categories[0].name, "Möbel");
    assert_eq!(entry.categories[1].name, "");

    assert_eq!(entry.links.len(), 2);
    let with_file = &entry.links[0];
    assert_eq!(with_file.rel, "design-file");
    assert_eq!(with_file.link_type, "application/rfa");
    assert_eq!(with_file.href, "Comfy%20Chair.rfa");
    let design_file = with_file.design_file.as_ref().unwrap();
    assert_eq!(design_file.name, "Comfy Chair.rfa");
    assert_eq!(design_file.product, "Revit");
    assert_eq!(design_file.product_version, "2021");
    assert_eq!(design_file.updated, Utc.with_ymd_and_hms(2020, 12, 1, 9, 0, 0).unwrap());
    assert!(entry.links[1].design_file.is_none());

    assert_eq!(entry.features.len(), 1);
    let feature = &entry.features[0];
    assert_eq!(feature.name, "Dimensions");
    assert_eq!(feature.groups.len(), 1);
    assert_eq!(feature.groups[0].name, "Geometry");

    let family = entry.family.as_ref().unwrap();
    assert_eq!(family.family_type, "system");
    assert_eq!(family.variation_count, 3);
    assert_eq!(family.parts.len(), 1);
    assert_eq!(family.parts[0].name, "Chair 450mm");
    assert_eq!(family.parts[0].part_type, "catalog");

    assert!(extraction.namespace_leaks.is_empty());
    assert!(!extraction.repaired);
}

#[test]
fn group_parameters_skip_vendor_elements_and_any_title() {
    let blob = container(SAMPLE.as_bytes());
    let entry = extract_entry_at(&blob, fixed_now()).unwrap().entry;
    let parameters = &entry.features[0].groups[0].parameters;

    let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Width", "Depth"]);

    let depth = &parameters[1];
    assert_eq!(depth.display_name.as_deref(), Some("Seat Depth"));
    assert_eq!(depth.param_type, "system");
    assert_eq!(depth.type_of_parameter.as_deref(), Some("Länge"));
    assert_eq!(depth.units.as_deref(), Some("millimeter"));
    assert_eq!(depth.value.as_deref(), Some("450"));
}

#[test]
fn part_parameters_skip_only_the_syndication_title() {
    let blob = container(SAMPLE.as_bytes());
    let entry = extract_entry_at(&blob, fixed_now()).unwrap().entry;
    let parameters = &entry.family.as_ref().unwrap().parts[0].parameters;

    // the no-namespace Title and the vendor-namespace material are kept,
    // unlike the group case above
    let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Title", "material", "Height"]);
    assert_eq!(parameters[0].value.as_deref(), Some("part child named like a title"));
    assert_eq!(parameters[1].value.as_deref(), Some("Oak"));
}

#[test]
fn end_to_end_width_parameter_defaults() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:A="urn:schemas-autodesk-com:partatom">
  <title>Minimal</title>
  <A:features>
    <A:feature>
      <A:title>F</A:title>
      <A:group>
        <A:title>G</A:title>
        <Width type="custom">100</Width>
      </A:group>
    </A:feature>
  </A:features>
</entry>"#;
    let entry = extract_entry_from_str_at(xml, fixed_now()).unwrap();
    let width = &entry.features[0].groups[0].parameters[0];
    assert_eq!(width.name, "Width");
    assert_eq!(width.param_type, "custom");
    assert_eq!(width.display_name, None);
    assert_eq!(width.type_of_parameter, None);
    assert_eq!(width.units, None);
    assert_eq!(width.value.as_deref(), Some("100"));
}

#[test]
fn unparsable_updated_falls_back_to_the_injected_clock() {
    let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>x</title><updated>not-a-date</updated></entry>"#;
    let entry = extract_entry_from_str_at(xml, fixed_now()).unwrap();
    assert_eq!(entry.updated, fixed_now());
}

#[test]
fn missing_updated_falls_back_to_the_injected_clock() {
    let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>x</title></entry>"#;
    let entry = extract_entry_from_str_at(xml, fixed_now()).unwrap();
    assert_eq!(entry.updated, fixed_now());
}

#[test]
fn variation_count_coercion() {
    for (text, expected) in [("12", 12), ("abc", 0), (" 7 ", 7)] {
        let xml = format!(
            "<entry xmlns=\"http://www.w3.org/2005/Atom\" \
             xmlns:A=\"urn:schemas-autodesk-com:partatom\">\
             <A:family><A:variationCount>{text}</A:variationCount></A:family></entry>"
        );
        let entry = extract_entry_from_str_at(&xml, fixed_now()).unwrap();
        assert_eq!(entry.family.unwrap().variation_count, expected, "text {text:?}");
    }
    let absent = "<entry xmlns=\"http://www.w3.org/2005/Atom\" \
        xmlns:A=\"urn:schemas-autodesk-com:partatom\"><A:family/></entry>";
    let entry = extract_entry_from_str_at(absent, fixed_now()).unwrap();
    assert_eq!(entry.family.unwrap().variation_count, 0);
}

#[test]
fn absent_family_is_none() {
    let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>x</title></entry>"#;
    let entry = extract_entry_from_str_at(xml, fixed_now()).unwrap();
    assert!(entry.family.is_none());
    assert!(entry.features.is_empty());
    assert!(entry.links.is_empty());
}

#[test]
fn family_defaults_apply() {
    let xml = "<entry xmlns=\"http://www.w3.org/2005/Atom\" \
        xmlns:A=\"urn:schemas-autodesk-com:partatom\">\
        <A:family><A:part><title>P</title></A:part></A:family></entry>";
    let entry = extract_entry_from_str_at(xml, fixed_now()).unwrap();
    let family = entry.family.unwrap();
    assert_eq!(family.family_type, "user");
    assert_eq!(family.parts[0].part_type, "user");
}

#[test]
fn direct_xml_entry_point_repairs_once() {
    let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>R & D</title></entry>"#;
    let entry = extract_entry_from_str_at(xml, fixed_now()).unwrap();
    assert_eq!(entry.name, "R & D");
}

#[test]
fn utf16_bytes_reach_the_direct_entry_point() {
    let xml = "<entry xmlns=\"http://www.w3.org/2005/Atom\"><title>Stuhl</title></entry>";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in xml.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let entry = rfax_core::service::extract_entry_from_bytes(&bytes).unwrap();
    assert_eq!(entry.name, "Stuhl");
}
