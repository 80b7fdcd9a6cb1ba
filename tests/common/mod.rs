//! MARCXML builders shared by the integration tests
#![allow(dead_code)]

use marc_validate::{RecordValidator, Tally, ValidationError};

pub const MARC_NS: &str = "http://www.loc.gov/MARC21/slim";

/// A leader that matches the MARC 21 slim pattern
pub const LEADER: &str = "00000nam a2200000 a 4500";

/// Builds one `<record>` element
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    leader: Option<String>,
    id: Option<String>,
    control_fields: Vec<String>,
    data_fields: Vec<String>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self {
            leader: Some(LEADER.to_string()),
            id: None,
            control_fields: Vec::new(),
            data_fields: Vec::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn leader(mut self, leader: &str) -> Self {
        self.leader = Some(leader.to_string());
        self
    }

    pub fn without_leader(mut self) -> Self {
        self.leader = None;
        self
    }

    pub fn control_field(mut self, tag: &str, value: &str) -> Self {
        self.control_fields
            .push(format!(r#"<controlfield tag="{tag}">{value}</controlfield>"#));
        self
    }

    pub fn data_field(mut self, tag: &str, subfields: &[(&str, &str)]) -> Self {
        let subfields: String = subfields
            .iter()
            .map(|(code, value)| format!(r#"<subfield code="{code}">{value}</subfield>"#))
            .collect();
        self.data_fields.push(format!(
            r#"<datafield tag="{tag}" ind1=" " ind2=" ">{subfields}</datafield>"#
        ));
        self
    }

    /// Insert markup verbatim after the data fields
    pub fn raw(mut self, xml: &str) -> Self {
        self.data_fields.push(xml.to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut xml = String::from("<record>");
        if let Some(leader) = &self.leader {
            xml.push_str(&format!("<leader>{leader}</leader>"));
        }
        if let Some(id) = &self.id {
            xml.push_str(&format!(r#"<controlfield tag="001">{id}</controlfield>"#));
        }
        for field in self.control_fields.iter().chain(&self.data_fields) {
            xml.push_str(field);
        }
        xml.push_str("</record>");
        xml
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A titled, valid record with the given identifier
pub fn valid_record(id: &str) -> String {
    RecordBuilder::new()
        .id(id)
        .data_field("245", &[("a", "A title")])
        .build()
}

/// Wrap records in a namespaced `<collection>`, one per line
pub fn collection(records: &[String]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<collection xmlns=\"{MARC_NS}\">\n"
    );
    for record in records {
        xml.push_str("  ");
        xml.push_str(record);
        xml.push('\n');
    }
    xml.push_str("</collection>\n");
    xml
}

/// Validate against the bundled schema, returning the result and the report
pub fn run_bundled(xml: &str) -> (Result<Tally, ValidationError>, String) {
    run_bytes(xml.as_bytes())
}

pub fn run_bytes(bytes: &[u8]) -> (Result<Tally, ValidationError>, String) {
    let validator = RecordValidator::with_bundled_schema().unwrap();
    let mut out = Vec::new();
    let result = validator.validate(bytes, &mut out);
    (result, String::from_utf8(out).unwrap())
}
