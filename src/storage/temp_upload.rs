use std::io;
use std::path::Path;

use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// An uploaded file spooled to disk. The file is deleted when this value is
/// dropped, whichever way the request ends.
pub struct TempUpload {
    file: NamedTempFile,
    writer: Option<tokio::fs::File>,
    filename: String,
    len: u64,
}

impl TempUpload {
    /// Create an empty spool file in `spool_dir`, or the system temp dir.
    pub fn create(spool_dir: Option<&Path>, filename: impl Into<String>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docsift-upload-");
        let file = match spool_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let filename = filename.into();
        debug!(path = %file.path().display(), filename = %filename, "Spooling upload");
        Ok(Self {
            file,
            writer: None,
            filename,
            len: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => tokio::fs::File::from_std(self.file.reopen()?),
        };
        let writer = self.writer.insert(writer);
        writer.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    /// Flush pending writes and read the whole upload back.
    pub async fn read_all(&mut self) -> io::Result<Bytes> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
        }
        tokio::fs::read(self.file.path()).await.map(Bytes::from)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunks_are_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut upload = TempUpload::create(Some(dir.path()), "notes.txt").unwrap();
        upload.write_chunk(b"hello ").await.unwrap();
        upload.write_chunk(b"world").await.unwrap();

        assert_eq!(upload.len(), 11);
        assert_eq!(upload.filename(), "notes.txt");
        assert!(upload.path().starts_with(dir.path()));
        assert_eq!(upload.read_all().await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[test]
    fn test_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = tokio_test::block_on(async {
            let mut upload = TempUpload::create(Some(dir.path()), "a.pdf").unwrap();
            upload.write_chunk(b"%PDF").await.unwrap();
            let path = upload.path().to_path_buf();
            assert!(path.exists());
            drop(upload);
            path
        });
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_upload_reads_back_empty() {
        let mut upload = TempUpload::create(None, "").unwrap();
        assert!(upload.is_empty());
        assert!(upload.read_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_missing_spool_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(TempUpload::create(Some(&missing), "x.txt").is_err());
    }
}
