//! Transparent (gzip) file I/O.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder, Compression};

/// Returns whether the path looks like a gzip or bgzip file.
pub fn is_gz<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    [Some(Some("gz")), Some(Some("bgz"))].contains(&path.as_ref().extension().map(|s| s.to_str()))
}

/// Open `path` for reading, decompressing if it is named like a gzip file.
///
/// Multi-member gzip files (as written by `bgzip`) are read completely.  The error keeps
/// the kind of the underlying [`std::io::Error`] and names the path.
pub fn open_read_maybe_gz<P>(path: P) -> std::io::Result<Box<dyn BufRead>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map(BufReader::new).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("could not open {:?} for reading: {}", path, e),
        )
    })?;
    if is_gz(path) {
        tracing::trace!("Reading {:?} as gzip", path);
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        tracing::trace!("Reading {:?} as plain text", path);
        Ok(Box::new(file))
    }
}

/// Open `path` for writing, compressing with gzip if it is named like a gzip file.
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write>, anyhow::Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)
        .map(BufWriter::new)
        .map_err(|e| anyhow::anyhow!("could not create {:?}: {}", path, e))?;
    if is_gz(path) {
        tracing::trace!("Writing {:?} as gzip", path);
        Ok(Box::new(GzEncoder::new(file, Compression::default())))
    } else {
        tracing::trace!("Writing {:?} as plain text", path);
        Ok(Box::new(file))
    }
}

/// Open `path` as with `open_write_maybe_gz` or standard output if `None`.
pub fn open_write_or_stdout<P>(path: Option<P>) -> Result<Box<dyn Write>, anyhow::Error>
where
    P: AsRef<Path>,
{
    match path {
        Some(path) => open_write_maybe_gz(path),
        None => {
            tracing::trace!("Writing to stdout");
            Ok(Box::new(BufWriter::new(std::io::stdout().lock())))
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::{BufRead, Read, Write};

    use pretty_assertions::assert_eq;

    #[rstest::rstest]
    #[case("x.gz", true)]
    #[case("x.vcf.bgz", true)]
    #[case("x.vcf", false)]
    #[case("gz", false)]
    fn is_gz(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(super::is_gz(path), expected);
    }

    #[rstest::rstest]
    #[case("lines.txt")]
    #[case("lines.txt.gz")]
    fn open_read_maybe_gz(#[case] path: &str) -> Result<(), anyhow::Error> {
        let reader = super::open_read_maybe_gz(format!("tests/data/common/io/{}", path))?;

        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;

        assert_eq!(
            lines,
            vec!["line 1", "line 2", "line 3", "line 4", "line 5"]
        );

        Ok(())
    }

    #[test]
    fn open_read_missing_file() {
        let err = super::open_read_maybe_gz("tests/data/common/io/missing.txt")
            .err()
            .map(|e| (e.kind(), e.to_string()));

        assert!(matches!(
            err,
            Some((std::io::ErrorKind::NotFound, msg)) if msg.starts_with("could not open")
        ));
    }

    #[rstest::rstest]
    #[case("out.txt")]
    #[case("out.txt.gz")]
    fn open_write_maybe_gz(#[case] filename: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let tmp_file_path = tmp_dir.join(filename);

        {
            let mut writer = super::open_write_maybe_gz(&tmp_file_path)?;
            for i in 1..3000 {
                writer.write_all(format!("{}\n", i).as_bytes())?;
            }
            writer.flush()?;
        }

        let mut raw = Vec::new();
        std::fs::File::open(&tmp_file_path)?.read_to_end(&mut raw)?;
        assert_eq!(raw.starts_with(&[0x1f, 0x8b]), super::is_gz(&tmp_file_path));

        let mut buf = String::new();
        super::open_read_maybe_gz(&tmp_file_path)?.read_to_string(&mut buf)?;
        assert_eq!(buf.lines().count(), 2999);
        assert_eq!(buf.lines().last(), Some("2999"));

        Ok(())
    }
}
