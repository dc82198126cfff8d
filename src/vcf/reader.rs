//! Forward-only reader for VCF files.

use std::{io::BufRead, path::Path, rc::Rc};

use super::{error::Error, header::ColumnIndex, line::is_meta, record::VariantRecord};
use crate::common::io::std::open_read_maybe_gz;

/// Line-based VCF reader.
///
/// Call [`VcfReader::jump_to_variants`] once before reading any variants.
pub struct VcfReader<R: BufRead> {
    inner: R,
    columns: Option<Rc<ColumnIndex>>,
    meta_lines: Vec<String>,
    buf: String,
}

impl VcfReader<Box<dyn BufRead>> {
    /// Open the file at `path`, transparently decompressing `.gz`/`.bgz` files.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Ok(Self::new(open_read_maybe_gz(path)?))
    }
}

impl<R: BufRead> VcfReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            columns: None,
            meta_lines: Vec::new(),
            buf: String::new(),
        }
    }

    /// Read the next line into the buffer without line terminator.
    ///
    /// Returns `false` at the end of input.
    fn read_line(&mut self) -> Result<bool, Error> {
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Ok(false);
        }
        let len = self.buf.trim_end_matches(['\n', '\r']).len();
        self.buf.truncate(len);
        Ok(true)
    }

    /// Skip the meta lines and parse the header line.
    ///
    /// Afterwards, the next line read is the first data line.  Fails with
    /// [`Error::InvalidHeader`] if the first non-meta line is not a valid header or the
    /// input ends before one.
    pub fn jump_to_variants(&mut self) -> Result<&ColumnIndex, Error> {
        loop {
            if !self.read_line()? {
                return Err(Error::InvalidHeader(String::new()));
            }
            if is_meta(&self.buf) {
                self.meta_lines.push(self.buf.clone());
            } else {
                break;
            }
        }

        let header = std::mem::take(&mut self.buf);
        self.set_column_names(&header)
    }

    /// Parse `header_line` and use it as column index for subsequent records.
    pub fn set_column_names(&mut self, header_line: &str) -> Result<&ColumnIndex, Error> {
        let columns = ColumnIndex::from_header_line(header_line)?;
        let columns = self.columns.insert(Rc::new(columns));
        Ok(&**columns)
    }

    /// The column index, [`Error::ColumnsNotSet`] before the header was read.
    pub fn columns(&self) -> Result<&Rc<ColumnIndex>, Error> {
        self.columns.as_ref().ok_or(Error::ColumnsNotSet)
    }

    /// The meta lines skipped by [`VcfReader::jump_to_variants`].
    pub fn meta_lines(&self) -> &[String] {
        &self.meta_lines
    }

    /// The sample names from the header.
    pub fn sample_names(&self) -> Result<&[String], Error> {
        self.columns()?.sample_names()
    }

    /// Whether `line` is a data line for the current header.
    pub fn is_variant_line(&self, line: &str) -> Result<bool, Error> {
        Ok(self.columns()?.is_variant_line(line))
    }

    /// Parse a data line against the current header.
    pub fn parse_line(&self, line: &str) -> Result<VariantRecord, Error> {
        VariantRecord::parse(self.columns()?, line)
    }

    /// Read and parse the next data line, `None` at the end of input.
    pub fn read_variant(&mut self) -> Result<Option<VariantRecord>, Error> {
        let columns = self.columns()?.clone();
        if !self.read_line()? {
            return Ok(None);
        }
        VariantRecord::parse(&columns, &self.buf).map(Some)
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<VariantRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_variant().transpose()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::vcf::{parse_info, parse_samples, sample_gt, ErrorKind};

    const PATH_EXAMPLE: &str = "tests/data/vcf/example.vcf";

    #[test]
    fn jump_to_variants() -> Result<(), anyhow::Error> {
        let mut reader = VcfReader::from_path(PATH_EXAMPLE)?;

        let columns = reader.jump_to_variants()?;
        assert_eq!(columns.len(), 12);
        assert_eq!(reader.meta_lines().len(), 18);
        assert_eq!(reader.meta_lines()[0], "##fileformat=VCFv4.1");
        assert_eq!(reader.sample_names()?, ["NA00001", "NA00002", "NA00003"]);

        Ok(())
    }

    #[test]
    fn read_all_variants() -> Result<(), anyhow::Error> {
        let mut reader = VcfReader::from_path(PATH_EXAMPLE)?;
        reader.jump_to_variants()?;

        let records = reader.by_ref().collect::<Result<Vec<_>, _>>()?;

        assert_eq!(records.len(), 5);
        assert_eq!(
            records.iter().map(|r| r.pos.as_str()).collect::<Vec<_>>(),
            vec!["14370", "17330", "1110696", "1230237", "1234567"]
        );
        assert!(reader.read_variant()?.is_none());

        Ok(())
    }

    #[test]
    fn example_file_scenarios() -> Result<(), anyhow::Error> {
        let mut reader = VcfReader::from_path(PATH_EXAMPLE)?;
        reader.jump_to_variants()?;

        let first = reader.read_variant()?.expect("first record");
        let info = parse_info(&first);
        assert_eq!(info.get("NS"), Some("3"));
        assert_eq!(info.get("DP"), Some("14"));
        assert_eq!(info.get("AF"), Some("0.5"));
        assert_eq!(info.flags, vec!["DB", "H2"]);
        assert_eq!(sample_gt(&first, "NA00001", true)?, "G|G");
        assert_eq!(parse_samples(&first)?["NA00003"]["GT"], "1/1");

        let second = reader.read_variant()?.expect("second record");
        assert_eq!(sample_gt(&second, "NA00002", true)?, "T|A");

        let third = reader.read_variant()?.expect("third record");
        assert_eq!(sample_gt(&third, "NA00003", false)?, "T/T");

        let _fourth = reader.read_variant()?.expect("fourth record");
        let fifth = reader.read_variant()?.expect("fifth record");
        assert_eq!(sample_gt(&fifth, "NA00001", false)?, "G/GTC");

        Ok(())
    }

    #[test]
    fn read_before_header() {
        let mut reader = VcfReader::new("##fileformat=VCFv4.1\n".as_bytes());

        assert_eq!(
            reader.read_variant().unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
        assert_eq!(
            reader.parse_line("1\t1\t.\tA\tC\t.\t.\t.").unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
    }

    #[test]
    fn from_path_missing_file() {
        let err = VcfReader::from_path("tests/data/vcf/missing.vcf")
            .err()
            .map(|e| e.kind());

        assert_eq!(err, Some(ErrorKind::Io));
    }

    #[rstest::rstest]
    #[case("##fileformat=VCFv4.1\n")]
    #[case("##fileformat=VCFv4.1\n##CHROM\tPOS\tID\n")]
    #[case("##fileformat=VCFv4.1\n1\t1\t.\tA\tC\t.\t.\t.\n")]
    fn jump_to_variants_invalid(#[case] input: &str) {
        let mut reader = VcfReader::new(input.as_bytes());

        assert_eq!(
            reader.jump_to_variants().unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
    }

    #[test]
    fn read_variant_wrong_column_count() -> Result<(), anyhow::Error> {
        let input = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                     1\t100\t.\tA\tC\t.\tPASS\tDP=3\n\
                     1\t200\t.\tA\tC\t.\tPASS\n";
        let mut reader = VcfReader::new(input.as_bytes());
        reader.jump_to_variants()?;

        assert!(reader.read_variant()?.is_some());
        assert_eq!(
            reader.read_variant().unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );

        Ok(())
    }

    #[test]
    fn crlf_line_endings() -> Result<(), anyhow::Error> {
        let input = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\r\n\
                     1\t100\t.\tA\tC\t.\tPASS\tDP=3\r\n";
        let mut reader = VcfReader::new(input.as_bytes());
        reader.jump_to_variants()?;

        let record = reader.read_variant()?.expect("one record");
        assert_eq!(record.info, "DP=3");

        Ok(())
    }
}
