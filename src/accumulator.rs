//! Record-scoped validation accumulator
//!
//! Consumes the validating parser's event stream and turns the flat stream
//! of diagnostics into a per-record report. Nesting is tracked with an
//! explicit position state instead of a document tree; diagnostics are
//! buffered against the location they were reported at and flushed into the
//! record's log whenever an element starts or ends. A record is finalized
//! when the next record starts, and once more at end of stream.
//!
//! Report format, one block per invalid record:
//!
//! ```text
//! ocm12345
//!   [245]: [Element 'subfield': The attribute 'code' is required but missing.]
//!   []: [Element 'controlfield': This element is not expected. Expected is ( leader ).]
//! ```
//!
//! followed by a single `<good> good; <bad> bad.` line after all records.
//! Blocks are not separated by blank lines; each ends at its last node line.

use std::fmt;
use std::io::{self, Write};

use indexmap::IndexSet;
use log::{debug, info, trace, warn};

use crate::events::{Attributes, RecordEvents, Severity};

const RECORD_ELEMENT: &str = "record";
const CONTROL_FIELD: &str = "controlfield";
const DATA_FIELD: &str = "datafield";
const LEADER: &str = "leader";
const SUBFIELD: &str = "subfield";

/// Tag of the control field holding the record identifier
pub const IDENTIFIER_TAG: &str = "001";

/// Where the accumulator currently sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    OutsideDocument,
    /// Inside the root element, between records
    InDocument,
    InRecord,
    InField,
    InSubfield,
    /// Below a subfield; the count is how many levels below
    Nested(usize),
}

impl Position {
    fn depth(self) -> i64 {
        match self {
            Position::OutsideDocument => -1,
            Position::InDocument => 0,
            Position::InRecord => 1,
            Position::InField => 2,
            Position::InSubfield => 3,
            Position::Nested(levels) => 3 + levels as i64,
        }
    }

    fn enter(self) -> Self {
        match self {
            Position::OutsideDocument => Position::InDocument,
            Position::InDocument => Position::InRecord,
            Position::InRecord => Position::InField,
            Position::InField => Position::InSubfield,
            Position::InSubfield => Position::Nested(1),
            Position::Nested(levels) => Position::Nested(levels + 1),
        }
    }

    fn exit(self) -> Self {
        match self {
            Position::OutsideDocument | Position::InDocument => Position::OutsideDocument,
            Position::InRecord => Position::InDocument,
            Position::InField => Position::InRecord,
            Position::InSubfield => Position::InField,
            Position::Nested(1) => Position::InSubfield,
            Position::Nested(levels) => Position::Nested(levels - 1),
        }
    }
}

/// One slot of the location stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Leader,
    Tag(String),
    /// A field or subfield without its identifying attribute
    NoTag,
    /// An element the record structure does not define
    Unlabeled,
}

impl Label {
    fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(tag) => Label::Tag(tag.to_string()),
            None => Label::NoTag,
        }
    }

    fn for_field(name: &str, attributes: &Attributes) -> Self {
        match name {
            CONTROL_FIELD | DATA_FIELD => Label::from_tag(attributes.get("tag")),
            LEADER => Label::Leader,
            _ => Label::Unlabeled,
        }
    }

    // MARCXML identifies subfields by `code`
    fn for_subfield(name: &str, attributes: &Attributes) -> Self {
        if name == SUBFIELD {
            Label::from_tag(attributes.get("code").or_else(|| attributes.get("tag")))
        } else {
            Label::Unlabeled
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Leader => f.write_str(LEADER),
            Label::Tag(tag) => f.write_str(tag),
            Label::NoTag => f.write_str("[no-tag]"),
            Label::Unlabeled => f.write_str("[unlabeled]"),
        }
    }
}

/// Good and bad record counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub good: u64,
    pub bad: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.good + self.bad
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} good; {} bad.", self.good, self.bad)
    }
}

fn bracketed<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let rendered: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

/// Stateful listener that classifies records and writes the report.
///
/// Bad-record blocks are written to `out` (and flushed) as each record is
/// finalized, so a caller sees partial output if the run is aborted.
pub struct RecordAccumulator<W: Write> {
    out: W,
    position: Position,
    location: Vec<Label>,
    pending: IndexSet<String>,
    log: String,
    record_id: String,
    capturing_id: bool,
    record_open: bool,
    tally: Tally,
}

impl<W: Write> RecordAccumulator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            position: Position::OutsideDocument,
            location: Vec::new(),
            pending: IndexSet::new(),
            log: String::new(),
            record_id: String::new(),
            capturing_id: false,
            record_open: false,
            tally: Tally::default(),
        }
    }

    /// Nesting depth: -1 above the root, 0 between records, 1 inside a
    /// record, 2 inside a field, 3 inside a subfield.
    pub fn depth(&self) -> i64 {
        self.position.depth()
    }

    /// Identifier of the current record as captured so far
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Current location, outermost first, e.g. `[245, a]`
    pub fn location_path(&self) -> String {
        bracketed(&self.location)
    }

    /// Account for the last record and write the summary line.
    pub fn finish(mut self) -> io::Result<Tally> {
        self.flush_pending();
        self.finalize_record()?;
        writeln!(self.out, "{}", self.tally)?;
        self.out.flush()?;
        info!("{}", self.tally);
        Ok(self.tally)
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let line = format!("  {}: {}\n", self.location_path(), bracketed(&self.pending));
        self.log.push_str(&line);
        self.pending.clear();
    }

    fn finalize_record(&mut self) -> io::Result<()> {
        if !self.record_open {
            // Diagnostics raised before the first record have no record to
            // belong to; report them without counting a record.
            if !self.log.is_empty() {
                warn!("diagnostics reported outside of any record");
                self.write_block()?;
            }
            self.record_id.clear();
            return Ok(());
        }
        self.record_open = false;

        if self.log.is_empty() {
            self.tally.good += 1;
            debug!("record {:?} is valid", self.record_id);
        } else {
            self.tally.bad += 1;
            debug!("record {:?} is invalid", self.record_id);
            self.write_block()?;
        }
        self.record_id.clear();
        Ok(())
    }

    fn write_block(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", self.record_id)?;
        self.out.write_all(self.log.as_bytes())?;
        self.out.flush()?;
        self.log.clear();
        Ok(())
    }
}

impl<W: Write> RecordEvents for RecordAccumulator<W> {
    fn element_enter(&mut self, name: &str, attributes: &Attributes) -> io::Result<()> {
        // Anything reported so far belongs to the node we are still in.
        self.flush_pending();

        let label = match self.position {
            Position::OutsideDocument => None,
            Position::InDocument => {
                if name == RECORD_ELEMENT {
                    self.finalize_record()?;
                    self.record_open = true;
                }
                None
            }
            Position::InRecord => {
                let label = Label::for_field(name, attributes);
                if name == CONTROL_FIELD && matches!(&label, Label::Tag(tag) if tag == IDENTIFIER_TAG)
                {
                    self.capturing_id = true;
                    self.record_id.clear();
                }
                Some(label)
            }
            Position::InField => Some(Label::for_subfield(name, attributes)),
            Position::InSubfield | Position::Nested(_) => Some(Label::Unlabeled),
        };

        if let Some(label) = label {
            self.location.push(label);
        }
        self.position = self.position.enter();
        Ok(())
    }

    fn element_exit(&mut self, _name: &str) -> io::Result<()> {
        self.position = self.position.exit();
        if self.position == Position::InRecord {
            self.capturing_id = false;
        }

        self.flush_pending();

        if self.position.depth() >= 1 {
            self.location.pop();
        }
        Ok(())
    }

    fn character_data(&mut self, text: &str) -> io::Result<()> {
        if self.capturing_id {
            self.record_id.push_str(text);
        }
        Ok(())
    }

    fn diagnostic(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        trace!("{:?} at {}: {}", severity, self.location_path(), message);
        self.pending.insert(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_LEADER: &str =
        "Element 'record': Missing child element(s). Expected is ( leader ).";

    type Acc<'a> = RecordAccumulator<&'a mut Vec<u8>>;

    fn run(script: impl FnOnce(&mut Acc<'_>)) -> (Tally, String) {
        let mut out = Vec::new();
        let tally = {
            let mut acc = RecordAccumulator::new(&mut out);
            script(&mut acc);
            acc.finish().unwrap()
        };
        (tally, String::from_utf8(out).unwrap())
    }

    fn enter(acc: &mut Acc<'_>, name: &str, attributes: &[(&str, &str)]) {
        let attributes: Attributes = attributes.iter().copied().collect();
        acc.element_enter(name, &attributes).unwrap();
    }

    fn exit(acc: &mut Acc<'_>, name: &str) {
        acc.element_exit(name).unwrap();
    }

    fn text(acc: &mut Acc<'_>, text: &str) {
        acc.character_data(text).unwrap();
    }

    fn diag(acc: &mut Acc<'_>, message: &str) {
        acc.diagnostic(Severity::Error, message).unwrap();
    }

    fn control_field(acc: &mut Acc<'_>, tag: &str, value: &str) {
        enter(acc, "controlfield", &[("tag", tag)]);
        text(acc, value);
        exit(acc, "controlfield");
    }

    fn leader(acc: &mut Acc<'_>) {
        enter(acc, "leader", &[]);
        text(acc, "00000nam a2200000 a 4500");
        exit(acc, "leader");
    }

    fn record(acc: &mut Acc<'_>, id: &str, body: impl FnOnce(&mut Acc<'_>)) {
        enter(acc, "record", &[]);
        leader(acc);
        control_field(acc, "001", id);
        body(acc);
        exit(acc, "record");
    }

    #[test]
    fn test_empty_stream() {
        let (tally, report) = run(|_| {});

        assert_eq!(tally, Tally { good: 0, bad: 0 });
        assert_eq!(report, "0 good; 0 bad.\n");
    }

    #[test]
    fn test_collection_without_records() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            exit(acc, "collection");
        });

        assert_eq!(tally.total(), 0);
        assert_eq!(report, "0 good; 0 bad.\n");
    }

    #[test]
    fn test_single_record_counted_once() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "r1", |_| {});
            exit(acc, "collection");
        });

        assert_eq!(tally, Tally { good: 1, bad: 0 });
        assert_eq!(report, "1 good; 0 bad.\n");
    }

    #[test]
    fn test_valid_then_missing_field() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "r1", |_| {});
            enter(acc, "record", &[]);
            control_field(acc, "001", "r2");
            exit(acc, "record");
            // Content model errors surface once the record has closed
            diag(acc, MISSING_LEADER);
            exit(acc, "collection");
        });

        assert_eq!(tally, Tally { good: 1, bad: 1 });
        assert_eq!(
            report,
            format!("r2\n  []: [{}]\n1 good; 1 bad.\n", MISSING_LEADER)
        );
    }

    #[test]
    fn test_identifier_extraction() {
        let (_, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "ocm12345", |acc| diag(acc, "bad"));
            exit(acc, "collection");
        });

        assert_eq!(report.lines().next(), Some("ocm12345"));
    }

    #[test]
    fn test_identifier_split_across_text_events() {
        let (_, report) = run(|acc| {
            enter(acc, "collection", &[]);
            enter(acc, "record", &[]);
            enter(acc, "controlfield", &[("tag", "001")]);
            text(acc, "ocm");
            text(acc, "12345");
            exit(acc, "controlfield");
            diag(acc, "bad");
            exit(acc, "record");
            exit(acc, "collection");
        });

        assert_eq!(report.lines().next(), Some("ocm12345"));
    }

    #[test]
    fn test_missing_identifier_gives_empty_line() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            enter(acc, "record", &[]);
            leader(acc);
            control_field(acc, "003", "OCoLC");
            diag(acc, "bad");
            exit(acc, "record");
            exit(acc, "collection");
        });

        assert_eq!(tally.bad, 1);
        assert_eq!(report, "\n  []: [bad]\n0 good; 1 bad.\n");
    }

    #[test]
    fn test_capture_stops_when_field_closes() {
        let (_, report) = run(|acc| {
            enter(acc, "collection", &[]);
            enter(acc, "record", &[]);
            control_field(acc, "001", "id-1");
            text(acc, "\n  ");
            control_field(acc, "005", "20240101");
            diag(acc, "bad");
            exit(acc, "record");
            exit(acc, "collection");
        });

        assert_eq!(report.lines().next(), Some("id-1"));
    }

    #[test]
    fn test_identifier_does_not_leak_into_next_record() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "first", |_| {});
            enter(acc, "record", &[]);
            leader(acc);
            diag(acc, "bad");
            exit(acc, "record");
            exit(acc, "collection");
        });

        assert_eq!(tally, Tally { good: 1, bad: 1 });
        assert_eq!(report, "\n  []: [bad]\n1 good; 1 bad.\n");
    }

    #[test]
    fn test_duplicate_messages_collapse() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "dup", |acc| {
                enter(acc, "datafield", &[("tag", "245")]);
                diag(acc, "same complaint");
                diag(acc, "same complaint");
                diag(acc, "same complaint");
                exit(acc, "datafield");
            });
            exit(acc, "collection");
        });

        assert_eq!(tally.bad, 1);
        assert_eq!(report, "dup\n  [245]: [same complaint]\n0 good; 1 bad.\n");
    }

    #[test]
    fn test_messages_keep_first_reported_order() {
        let (_, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "order", |acc| {
                enter(acc, "datafield", &[("tag", "100")]);
                diag(acc, "zeta");
                diag(acc, "alpha");
                diag(acc, "zeta");
                exit(acc, "datafield");
            });
            exit(acc, "collection");
        });

        assert!(report.contains("  [100]: [zeta, alpha]\n"));
    }

    #[test]
    fn test_one_line_per_node_in_document_order() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "multi", |acc| {
                enter(acc, "datafield", &[("tag", "245"), ("ind1", "1"), ("ind2", "0")]);
                enter(acc, "subfield", &[("code", "a")]);
                diag(acc, "first");
                exit(acc, "subfield");
                enter(acc, "subfield", &[("code", "c")]);
                exit(acc, "subfield");
                exit(acc, "datafield");
                enter(acc, "datafield", &[("tag", "650")]);
                diag(acc, "second");
                diag(acc, "third");
                exit(acc, "datafield");
            });
            exit(acc, "collection");
        });

        assert_eq!(tally, Tally { good: 0, bad: 1 });
        assert_eq!(
            report,
            "multi\n  [245, a]: [first]\n  [650]: [second, third]\n0 good; 1 bad.\n"
        );
    }

    #[test]
    fn test_diagnostic_before_enter_belongs_to_parent() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            enter(acc, "record", &[]);
            diag(acc, "controlfield not expected");
            control_field(acc, "001", "noleader");
            enter(acc, "datafield", &[("tag", "245")]);
            diag(acc, "code is required");
            enter(acc, "subfield", &[]);
            exit(acc, "subfield");
            exit(acc, "datafield");
            exit(acc, "record");
            exit(acc, "collection");
        });

        assert_eq!(tally, Tally { good: 0, bad: 1 });
        assert_eq!(
            report,
            "noleader\n  []: [controlfield not expected]\n  [245]: [code is required]\n0 good; 1 bad.\n"
        );
    }

    #[test]
    fn test_adjacent_blocks_have_no_separator() {
        let (_, report) = run(|acc| {
            enter(acc, "collection", &[]);
            for id in ["b1", "b2"] {
                record(acc, id, |acc| {
                    enter(acc, "datafield", &[("tag", "245")]);
                    diag(acc, "empty");
                    exit(acc, "datafield");
                });
            }
            exit(acc, "collection");
        });

        assert_eq!(
            report,
            "b1\n  [245]: [empty]\nb2\n  [245]: [empty]\n0 good; 2 bad.\n"
        );
    }

    #[test]
    fn test_same_node_flushed_twice_gives_two_lines() {
        let (_, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "twice", |acc| {
                enter(acc, "datafield", &[("tag", "245")]);
                diag(acc, "before subfield");
                enter(acc, "subfield", &[("code", "a")]);
                exit(acc, "subfield");
                diag(acc, "after subfield");
                exit(acc, "datafield");
            });
            exit(acc, "collection");
        });

        let block: Vec<&str> = report.lines().collect();
        assert_eq!(
            block,
            vec![
                "twice",
                "  [245]: [before subfield]",
                "  [245]: [after subfield]",
                "0 good; 1 bad.",
            ]
        );
    }

    #[test]
    fn test_boundary_diagnostic_attaches_to_closing_record() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "closing", |_| {});
            diag(acc, "between records");
            record(acc, "opening", |_| {});
            exit(acc, "collection");
        });

        assert_eq!(tally, Tally { good: 1, bad: 1 });
        assert_eq!(report, "closing\n  []: [between records]\n1 good; 1 bad.\n");
    }

    #[test]
    fn test_diagnostic_before_first_record_is_not_counted() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            diag(acc, "No matching global declaration available for the validation root.");
            record(acc, "r1", |_| {});
            exit(acc, "collection");
        });

        assert_eq!(tally, Tally { good: 1, bad: 0 });
        assert_eq!(
            report,
            "\n  []: [No matching global declaration available for the validation root.]\n\
             1 good; 0 bad.\n"
        );
    }

    #[test]
    fn test_diagnostic_after_last_event_is_reported() {
        let (tally, report) = run(|acc| {
            enter(acc, "collection", &[]);
            record(acc, "tail", |_| {});
            exit(acc, "collection");
            diag(acc, "late");
        });

        assert_eq!(tally.bad, 1);
        assert_eq!(report, "tail\n  []: [late]\n0 good; 1 bad.\n");
    }

    #[test]
    fn test_labels() {
        let (_, report) = run(|acc| {
            enter(acc, "collection", &[]);
            enter(acc, "record", &[]);
            enter(acc, "leader", &[]);
            diag(acc, "leader problem");
            exit(acc, "leader");
            enter(acc, "controlfield", &[]);
            diag(acc, "no tag");
            exit(acc, "controlfield");
            enter(acc, "datafield", &[("tag", "500")]);
            enter(acc, "subfield", &[]);
            diag(acc, "no code");
            exit(acc, "subfield");
            enter(acc, "note", &[("code", "x")]);
            diag(acc, "stray child");
            exit(acc, "note");
            exit(acc, "datafield");
            enter(acc, "extra", &[("tag", "999")]);
            diag(acc, "stray field");
            exit(acc, "extra");
            exit(acc, "record");
            exit(acc, "collection");
        });

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "",
                "  [leader]: [leader problem]",
                "  [[no-tag]]: [no tag]",
                "  [500, [no-tag]]: [no code]",
                "  [500, [unlabeled]]: [stray child]",
                "  [[unlabeled]]: [stray field]",
                "0 good; 1 bad.",
            ]
        );
    }

    #[test]
    fn test_depth_and_location_stay_in_step() {
        let mut out = Vec::new();
        let mut acc = RecordAccumulator::new(&mut out);
        assert_eq!(acc.depth(), -1);

        enter(&mut acc, "collection", &[]);
        assert_eq!(acc.depth(), 0);
        enter(&mut acc, "record", &[]);
        assert_eq!(acc.depth(), 1);
        assert_eq!(acc.location_path(), "[]");
        enter(&mut acc, "datafield", &[("tag", "245")]);
        assert_eq!(acc.depth(), 2);
        enter(&mut acc, "subfield", &[("code", "a")]);
        assert_eq!(acc.depth(), 3);
        assert_eq!(acc.location_path(), "[245, a]");
        enter(&mut acc, "span", &[]);
        assert_eq!(acc.depth(), 4);
        assert_eq!(acc.location_path(), "[245, a, [unlabeled]]");

        exit(&mut acc, "span");
        exit(&mut acc, "subfield");
        assert_eq!(acc.location_path(), "[245]");
        exit(&mut acc, "datafield");
        exit(&mut acc, "record");
        assert_eq!(acc.depth(), 0);
        assert_eq!(acc.location_path(), "[]");
        exit(&mut acc, "collection");
        assert_eq!(acc.depth(), -1);

        assert_eq!(acc.finish().unwrap(), Tally { good: 1, bad: 0 });
    }

    #[test]
    fn test_second_identifier_field_resets_buffer() {
        let (_, report) = run(|acc| {
            enter(acc, "collection", &[]);
            enter(acc, "record", &[]);
            control_field(acc, "001", "old");
            control_field(acc, "001", "new");
            diag(acc, "bad");
            exit(acc, "record");
            exit(acc, "collection");
        });

        assert_eq!(report.lines().next(), Some("new"));
    }

    #[test]
    fn test_record_id_visible_mid_record() {
        let mut out = Vec::new();
        let mut acc = RecordAccumulator::new(&mut out);
        enter(&mut acc, "collection", &[]);
        enter(&mut acc, "record", &[]);
        control_field(&mut acc, "001", "in-progress");

        assert_eq!(acc.record_id(), "in-progress");
    }

    #[test]
    fn test_same_events_same_report() {
        fn script(acc: &mut Acc<'_>) {
            enter(acc, "collection", &[]);
            record(acc, "a", |acc| diag(acc, "one"));
            record(acc, "b", |_| {});
            record(acc, "c", |acc| {
                enter(acc, "datafield", &[("tag", "020")]);
                diag(acc, "two");
                exit(acc, "datafield");
            });
            exit(acc, "collection");
        }

        let first = run(script);
        let second = run(script);

        assert_eq!(first, second);
        assert_eq!(first.0, Tally { good: 1, bad: 2 });
    }

    #[test]
    fn test_write_failure_propagates() {
        struct BrokenPipe;

        impl Write for BrokenPipe {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut acc = RecordAccumulator::new(BrokenPipe);
        let none = Attributes::new();
        acc.element_enter("collection", &none).unwrap();
        acc.element_enter("record", &none).unwrap();
        acc.diagnostic(Severity::Error, "bad").unwrap();
        acc.element_exit("record").unwrap();

        let err = acc.element_enter("record", &none).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_tally_display() {
        let tally = Tally { good: 12, bad: 3 };
        assert_eq!(tally.to_string(), "12 good; 3 bad.");
        assert_eq!(tally.total(), 15);
    }
}
