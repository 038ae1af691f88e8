//! Message attachments.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use mailseal_mime::ContentType;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// An immutable attachment: content type (carrying the name) and raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    content_type: ContentType,
    data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from bytes.
    ///
    /// The media type defaults to `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// Returns an error if `media_type` is not a valid content type.
    pub fn from_bytes(
        data: impl Into<Vec<u8>>,
        name: impl Into<String>,
        media_type: Option<&str>,
    ) -> Result<Self> {
        let content_type = parse_media_type(media_type)?;
        Ok(Self::with_content_type(data, content_type, Some(name.into())))
    }

    /// Creates an attachment with an explicit content type.
    ///
    /// A given `name` is stored as the content type's `name` parameter.
    #[must_use]
    pub fn with_content_type(
        data: impl Into<Vec<u8>>,
        content_type: ContentType,
        name: Option<String>,
    ) -> Self {
        let content_type = match name {
            Some(name) => content_type.with_name(name),
            None => content_type,
        };
        Self {
            content_type,
            data: data.into(),
        }
    }

    /// Reads an attachment from any reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails.
    pub fn from_reader(
        mut reader: impl Read,
        name: impl Into<String>,
        content_type: ContentType,
    ) -> Result<Self> {
        let name = name.into();
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|source| Error::ReadAttachment {
                name: name.clone(),
                source,
            })?;
        Ok(Self::with_content_type(data, content_type, Some(name)))
    }

    /// Reads an attachment from a file; the name is the file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or `media_type` is invalid.
    pub fn from_path(path: impl AsRef<Path>, media_type: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let content_type = parse_media_type(media_type)?;
        let data = fs::read(path).map_err(|source| Error::ReadAttachment {
            name: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        debug!(path = %path.display(), len = data.len(), "read attachment");
        Ok(Self::with_content_type(data, content_type, name))
    }

    /// Creates an attachment builder.
    #[must_use]
    pub fn builder() -> AttachmentBuilder {
        AttachmentBuilder::default()
    }

    /// Returns the attachment name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.content_type.name()
    }

    /// Returns the content type.
    #[must_use]
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("content_type", &self.content_type.to_string())
            .field("len", &self.data.len())
            .finish()
    }
}

fn parse_media_type(media_type: Option<&str>) -> Result<ContentType> {
    media_type.map_or_else(|| Ok(ContentType::octet_stream()), |m| Ok(ContentType::parse(m)?))
}

enum Source {
    Bytes(Vec<u8>),
    Reader(Box<dyn Read>),
    Path(PathBuf),
}

/// Builder for attachments whose content source is chosen at runtime.
#[derive(Default)]
pub struct AttachmentBuilder {
    name: Option<String>,
    content_type: Option<ContentType>,
    source: Option<Source>,
}

impl AttachmentBuilder {
    /// Sets the attachment name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Uses in-memory bytes as the content source.
    #[must_use]
    pub fn bytes(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.source = Some(Source::Bytes(data.into()));
        self
    }

    /// Uses a reader as the content source.
    #[must_use]
    pub fn reader(mut self, reader: impl Read + 'static) -> Self {
        self.source = Some(Source::Reader(Box::new(reader)));
        self
    }

    /// Uses a file as the content source.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(Source::Path(path.into()));
        self
    }

    /// Builds the attachment.
    ///
    /// A path source without an explicit name is named after its file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttachmentSource`] if no source was set, or
    /// [`Error::ReadAttachment`] if the source cannot be read.
    pub fn build(self) -> Result<Attachment> {
        let content_type = self.content_type.unwrap_or_else(ContentType::octet_stream);
        match self.source.ok_or(Error::MissingAttachmentSource)? {
            Source::Bytes(data) => Ok(Attachment::with_content_type(data, content_type, self.name)),
            Source::Reader(mut reader) => {
                let mut data = Vec::new();
                reader
                    .read_to_end(&mut data)
                    .map_err(|source| Error::ReadAttachment {
                        name: self.name.clone().unwrap_or_default(),
                        source,
                    })?;
                Ok(Attachment::with_content_type(data, content_type, self.name))
            }
            Source::Path(path) => {
                let data = fs::read(&path).map_err(|source| Error::ReadAttachment {
                    name: path.display().to_string(),
                    source,
                })?;
                let name = self.name.or_else(|| {
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                });
                Ok(Attachment::with_content_type(data, content_type, name))
            }
        }
    }
}

/// Ordered set of attachments.
///
/// Exact duplicates are ignored on insertion. Bulk copy-out is not
/// supported; iterate instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentSet {
    attachments: Vec<Attachment>,
}

impl AttachmentSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attachment; returns false if an equal one is already present.
    pub fn add(&mut self, attachment: Attachment) -> bool {
        if self.contains(&attachment) {
            warn!(name = attachment.name(), "ignoring duplicate attachment");
            return false;
        }
        self.attachments.push(attachment);
        true
    }

    /// Removes an attachment; returns false if it was not present.
    pub fn remove(&mut self, attachment: &Attachment) -> bool {
        match self.attachments.iter().position(|a| a == attachment) {
            Some(index) => {
                self.attachments.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns true if an equal attachment is present.
    #[must_use]
    pub fn contains(&self, attachment: &Attachment) -> bool {
        self.attachments.contains(attachment)
    }

    /// Removes all attachments.
    pub fn clear(&mut self) {
        self.attachments.clear();
    }

    /// Returns the number of attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    /// Returns true if there are no attachments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attachment> {
        self.attachments.iter()
    }

    /// Bulk copy-out is not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn copy_to(&self, _target: &mut [Attachment]) -> Result<()> {
        Err(Error::Unsupported("AttachmentSet::copy_to"))
    }
}

impl<'a> IntoIterator for &'a AttachmentSet {
    type Item = &'a Attachment;
    type IntoIter = std::slice::Iter<'a, Attachment>;

    fn into_iter(self) -> Self::IntoIter {
        self.attachments.iter()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    fn report() -> Attachment {
        Attachment::from_bytes(b"%PDF".to_vec(), "report.pdf", Some("application/pdf")).unwrap()
    }

    #[test]
    fn test_from_bytes_sets_name() {
        let attachment = report();
        assert_eq!(attachment.name(), Some("report.pdf"));
        assert_eq!(attachment.content_type().media_type(), "application/pdf");
        assert_eq!(
            attachment.content_type().to_string(),
            "application/pdf; name=\"report.pdf\""
        );
        assert_eq!(attachment.data(), b"%PDF");
    }

    #[test]
    fn test_default_media_type() {
        let attachment = Attachment::from_bytes(vec![0u8, 1], "blob", None).unwrap();
        assert_eq!(
            attachment.content_type().media_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_invalid_media_type() {
        let err = Attachment::from_bytes(vec![], "x", Some("nonsense")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_from_reader() {
        let attachment =
            Attachment::from_reader(&b"abc"[..], "a.txt", ContentType::new("text", "plain"))
                .unwrap();
        assert_eq!(attachment.data(), b"abc");
        assert_eq!(attachment.name(), Some("a.txt"));
    }

    #[test]
    fn test_from_reader_failure() {
        let err = Attachment::from_reader(FailingReader, "a.txt", ContentType::octet_stream())
            .unwrap_err();
        assert!(matches!(err, Error::ReadAttachment { ref name, .. } if name == "a.txt"));
    }

    #[test]
    fn test_from_missing_path() {
        let err = Attachment::from_path("/definitely/not/here.bin", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_builder_requires_source() {
        let err = Attachment::builder().name("empty").build().unwrap_err();
        assert!(matches!(err, Error::MissingAttachmentSource));
    }

    #[test]
    fn test_builder_with_bytes() {
        let attachment = Attachment::builder()
            .name("notes.txt")
            .content_type(ContentType::new("text", "plain"))
            .bytes("hello")
            .build()
            .unwrap();
        assert_eq!(attachment.name(), Some("notes.txt"));
        assert_eq!(attachment.data(), b"hello");
    }

    #[test]
    fn test_builder_reader_failure() {
        let err = Attachment::builder()
            .name("broken")
            .reader(FailingReader)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_set_rejects_duplicates() {
        let mut set = AttachmentSet::new();
        assert!(set.add(report()));
        assert!(!set.add(report()));
        assert_eq!(set.len(), 1);

        let other = Attachment::from_bytes(b"%PDF".to_vec(), "other.pdf", None).unwrap();
        assert!(set.add(other.clone()));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&other));
    }

    #[test]
    fn test_set_keeps_order_and_removes() {
        let mut set = AttachmentSet::new();
        let a = Attachment::from_bytes(b"a".to_vec(), "a", None).unwrap();
        let b = Attachment::from_bytes(b"b".to_vec(), "b", None).unwrap();
        set.add(a.clone());
        set.add(b.clone());

        let names: Vec<_> = set.iter().filter_map(Attachment::name).collect();
        assert_eq!(names, vec!["a", "b"]);

        assert!(set.remove(&a));
        assert!(!set.remove(&a));
        assert_eq!((&set).into_iter().count(), 1);

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_set_copy_to_is_unsupported() {
        let mut set = AttachmentSet::new();
        set.add(report());
        let mut target = vec![report()];
        let err = set.copy_to(&mut target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
