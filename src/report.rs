//! Report projection and tab-separated report files.
//!
//! The projection turns the references of a document into flat rows, one per
//! reference, without ever failing: unreadable values become
//! [`UNKNOWN`]. Report files hold rows from many documents; the first column
//! is always the host file so rows can be correlated later.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::host::Document;
use crate::types::{ExternalReference, ReferenceKind};

/// Placeholder for a value that could not be read.
pub const UNKNOWN: &str = "unknown";

/// Header for model link reports.
pub const MODEL_LINK_HEADER: &[&str] = &[
    "HOSTFILE",
    "ID",
    "LINKNAME",
    "ISLOADED",
    "TYPEWORKSET",
    "ISFROMLOCALPATH",
    "PATHTYPE",
    "FILEPATH",
    "SHAREDSITE",
    "SHAREDSITENAME",
    "INSTANCEWORKSET",
    "DESIGNOPTION",
];

/// Header for CAD link reports.
pub const CAD_LINK_HEADER: &[&str] = &[
    "HOSTFILE",
    "ID",
    "LINKNAME",
    "ISVIEWSPECIFIC",
    "VIEWID",
    "WORKSET",
    "DESIGNOPTION",
    "ISPINNED",
    "DRAWLAYER",
    "FILEPATH",
];

/// Header for family reports.
pub const FAMILY_HEADER: &[&str] = &["HOSTFILE", "ID", "FAMILYNAME", "CATEGORY", "TYPECOUNT", "FILEPATH"];

/// Report header for a kind. The third column always holds the reference name.
pub const fn header(kind: ReferenceKind) -> &'static [&'static str] {
    return match kind {
        ReferenceKind::CadLink => CAD_LINK_HEADER,
        ReferenceKind::Family => FAMILY_HEADER,
        ReferenceKind::ModelLink => MODEL_LINK_HEADER,
    };
}

/// Index of the reference-name column in every header.
pub const NAME_COLUMN: usize = 2;

/// One audit record: a fixed-width tuple of strings matching the kind's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Column values, in header order.
    pub fields: Vec<String>,
}

/// Project the references of `kind` into report rows, in enumeration order.
///
/// Never fails. A column that cannot be read becomes [`UNKNOWN`]; a document
/// whose references cannot be enumerated yields no rows.
pub fn project<D: Document + ?Sized>(doc: &D, kind: ReferenceKind, host_file: &str) -> Vec<ReportRow> {
    let references = match doc.enumerate_references(kind) {
        Ok(references) => references,
        Err(e) => {
            tracing::warn!(kind = kind.label(), error = %e, "cannot enumerate references for report");
            return Vec::new();
        },
    };

    return references
        .iter()
        .map(|reference| return project_reference(doc, reference, header(kind), host_file))
        .collect();
}

/// Build one row, reading every column past the name from the host.
fn project_reference<D: Document + ?Sized>(
    doc: &D,
    reference: &ExternalReference,
    columns: &[&str],
    host_file: &str,
) -> ReportRow {
    let fields = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            return match (index, *column) {
                (0, _) => host_file.to_string(),
                (1, _) => reference.id.to_string(),
                (NAME_COLUMN, _) => reference.name.clone(),
                (_, "TYPECOUNT") => doc
                    .child_type_ids(reference)
                    .map_or_else(|_| UNKNOWN.to_string(), |ids| ids.len().to_string()),
                (_, column) => doc
                    .read_field(reference, column)
                    .unwrap_or_else(|_| UNKNOWN.to_string()),
            };
        })
        .collect();
    return ReportRow { fields };
}

/// Write a report file: the kind's header, then every row.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be created,
/// or `Error::Csv` if a record cannot be written.
pub fn write_report(path: &Path, kind: ReferenceKind, rows: &[ReportRow]) -> Result<(), Error> {
    let file = std::fs::File::create(path)?;
    return write_rows(file, Some(header(kind)), rows);
}

/// Append rows to a report shared by many documents. The header is written
/// only when the file does not exist yet.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be opened,
/// or `Error::Csv` if a record cannot be written.
pub fn append_report(path: &Path, kind: ReferenceKind, rows: &[ReportRow]) -> Result<(), Error> {
    let is_new = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let header = if is_new { Some(header(kind)) } else { None };
    return write_rows(file, header, rows);
}

/// Write tab-separated records without quoting.
///
/// # Errors
///
/// Returns `Error::Csv` if a record cannot be written.
fn write_rows(file: std::fs::File, header: Option<&[&str]>, rows: &[ReportRow]) -> Result<(), Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .flexible(true)
        .from_writer(file);

    if let Some(header) = header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row.fields.iter().map(|f| return sanitize(f)))?;
    }
    writer.flush()?;
    return Ok(());
}

/// Replace characters that would break the one-record-per-line format.
fn sanitize(value: &str) -> String {
    return value.replace(['\t', '\r', '\n'], " ");
}

/// One record read back from a report. Access is by index so records with
/// extra or missing trailing columns are still usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    /// Raw column values.
    fields: Vec<String>,
}

impl ReportRecord {
    /// Column `index`, or `None` past the end of this record.
    pub fn field(&self, index: usize) -> Option<&str> {
        return self.fields.get(index).map(String::as_str);
    }

    /// Host file the record belongs to (first column).
    pub fn host_file(&self) -> Option<&str> {
        return self.field(0);
    }

    /// Number of columns in this record.
    pub fn len(&self) -> usize {
        return self.fields.len();
    }

    /// Whether the record has no columns.
    pub fn is_empty(&self) -> bool {
        return self.fields.is_empty();
    }
}

/// A report file read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Column names from the first line.
    pub header: Vec<String>,
    /// Every following record, in file order.
    pub records: Vec<ReportRecord>,
}

impl Report {
    /// Parse report content.
    ///
    /// # Errors
    ///
    /// Returns `Error::Csv` if a line cannot be split,
    /// or `Error::CorruptReport` if there is no header line.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .has_headers(false)
            .from_reader(content.as_bytes());

        let mut lines = Vec::new();
        for record in reader.records() {
            let record = record?;
            lines.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let mut lines = lines.into_iter();
        let Some(header) = lines.next() else {
            return Err(Error::CorruptReport {
                path: origin.to_path_buf(),
                reason: "missing header row".to_string(),
            });
        };
        let records = lines.map(|fields| return ReportRecord { fields }).collect();
        return Ok(Self { header, records });
    }

    /// Read and parse a report from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReportNotFound` if the file doesn't exist,
    /// `Error::Io` for other read failures,
    /// or any error from [`Report::parse`].
    pub fn read(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ReportNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content, path);
    }

    /// Records whose first column equals `host_file`.
    pub fn records_for_host<'a>(&'a self, host_file: &'a str) -> impl Iterator<Item = &'a ReportRecord> + 'a {
        return self
            .records
            .iter()
            .filter(move |record| return record.host_file() == Some(host_file));
    }

    /// Distinct host files in first-seen order.
    pub fn host_files(&self) -> Vec<PathBuf> {
        let mut hosts: Vec<PathBuf> = Vec::new();
        for host in self.records.iter().filter_map(ReportRecord::host_file) {
            let host = PathBuf::from(host);
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }
        return hosts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    #[test]
    fn header_name_column_is_consistent() {
        for kind in [ReferenceKind::CadLink, ReferenceKind::Family, ReferenceKind::ModelLink] {
            let columns = header(kind);
            assert_eq!(columns[0], "HOSTFILE");
            assert_eq!(columns[1], "ID");
            assert!(columns[NAME_COLUMN].ends_with("NAME"));
        }
    }

    #[test]
    fn failed_reads_become_unknown() {
        let mut doc = MemoryDocument::new();
        let site = doc.add_reference(ReferenceKind::CadLink, "Site", &[]);
        doc.set_field(site, "ISPINNED", "True");
        doc.set_field(site, "WORKSET", "Links");
        doc.fail_field(site, "WORKSET");

        let rows = project(&doc, ReferenceKind::CadLink, "C:/models/host.rvt");

        assert_eq!(rows.len(), 1);
        let fields = &rows[0].fields;
        assert_eq!(fields.len(), CAD_LINK_HEADER.len());
        assert_eq!(fields[0], "C:/models/host.rvt");
        assert_eq!(fields[1], site.to_string());
        assert_eq!(fields[2], "Site");
        assert_eq!(fields[5], UNKNOWN);
        assert_eq!(fields[7], "True");
        assert_eq!(fields[9], UNKNOWN);
    }

    #[test]
    fn family_rows_count_types() {
        let mut doc = MemoryDocument::new();
        doc.add_reference(ReferenceKind::Family, "Door", &[1, 2, 3]);

        let rows = project(&doc, ReferenceKind::Family, "host.rvt");

        assert_eq!(rows[0].fields[4], "3");
    }

    #[test]
    fn enumeration_failure_yields_no_rows() {
        let mut doc = MemoryDocument::new();
        doc.add_reference(ReferenceKind::Family, "Door", &[]);
        doc.fail_enumeration("closed");
        assert!(project(&doc, ReferenceKind::Family, "host.rvt").is_empty());
    }

    #[test]
    fn parse_tolerates_ragged_records() {
        let content = "HOSTFILE\tID\tLINKNAME\n\
                       a.rvt\t1\tSite\textra\n\
                       b.rvt\t2\n";
        let report = Report::parse(content, Path::new("r.txt")).unwrap();

        assert_eq!(report.header, ["HOSTFILE", "ID", "LINKNAME"]);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].field(3), Some("extra"));
        assert_eq!(report.records[1].field(2), None);
        assert_eq!(report.records[1].host_file(), Some("b.rvt"));
    }

    #[test]
    fn quotes_are_plain_text() {
        let content = "HOSTFILE\tLINKNAME\nhost.rvt\t\"Quoted\" name\n";
        let report = Report::parse(content, Path::new("r.txt")).unwrap();
        assert_eq!(report.records[0].field(1), Some("\"Quoted\" name"));
    }

    #[test]
    fn empty_content_is_corrupt() {
        let result = Report::parse("", Path::new("r.txt"));
        assert!(matches!(result, Err(Error::CorruptReport { .. })));
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = Report::read(&dir.path().join("nope.txt"));
        assert!(matches!(result, Err(Error::ReportNotFound { .. })));
    }

    #[test]
    fn append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        let first = ReportRow { fields: vec!["a.rvt".into(), "1".into(), "Site".into()] };
        let second = ReportRow { fields: vec!["b.rvt".into(), "2".into(), "Roof\twith tab".into()] };

        append_report(&path, ReferenceKind::CadLink, &[first]).unwrap();
        append_report(&path, ReferenceKind::CadLink, &[second]).unwrap();

        let report = Report::read(&path).unwrap();
        assert_eq!(report.header.len(), CAD_LINK_HEADER.len());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].field(2), Some("Roof with tab"));
        assert_eq!(report.host_files(), [PathBuf::from("a.rvt"), PathBuf::from("b.rvt")]);
        assert_eq!(report.records_for_host("b.rvt").count(), 1);
    }
}
