//! Provides the PackURI value type and utilities for working with package URIs.
//!
//! A PackURI represents a part name within an OPC package, following the URI format
//! defined by the Open Packaging Conventions specification.

use std::borrow::Cow;

/// Represents a package URI, which is a partname within an OPC package.
///
/// PackURIs always begin with a forward slash and use forward slashes as path separators.
/// The zip member name of a part is its PackURI without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/word/document.xml")
    uri: String,
}

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// # Returns
    /// * `Ok(PackURI)` if the URI is valid
    /// * `Err` if the URI doesn't start with a forward slash
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Create a PackURI from a zip member name such as `word/document.xml`.
    pub fn from_membername(membername: &str) -> Self {
        PackURI {
            uri: format!("/{}", membername.trim_start_matches('/')),
        }
    }

    /// Create a PackURI from a relative reference and a base URI.
    ///
    /// This translates a relative reference (like "../media/image1.png") onto a base URI
    /// (like "/word/charts") to produce an absolute PackURI (like "/word/media/image1.png").
    /// Absolute references (starting with a slash) ignore the base, percent-escapes are
    /// decoded, and any fragment is dropped.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        let reference = relative_ref.split('#').next().unwrap_or_default();
        if reference.is_empty() {
            return Err(format!("Empty relationship target '{}'", relative_ref));
        }
        let reference = percent_decode(reference);
        let joined = if reference.starts_with('/') {
            reference.into_owned()
        } else {
            Self::join_paths(base_uri, &reference)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// Get the base URI (directory portion) of this PackURI.
    ///
    /// For example, "/word" for "/word/document.xml".
    /// For the package pseudo-partname "/", returns "/".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Get the filename portion of this PackURI.
    ///
    /// For example, "document.xml" for "/word/document.xml".
    /// For the package pseudo-partname "/", returns an empty string.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Get the lowercased extension of this PackURI, without the leading period.
    pub fn ext(&self) -> String {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => filename[pos + 1..].to_ascii_lowercase(),
            None => String::new(),
        }
    }

    /// Get the membername (URI with leading slash stripped).
    ///
    /// This is the form used as the Zip file membername for the package item.
    /// Returns an empty string for the package pseudo-partname "/".
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Get the PackURI of the .rels part corresponding to this PackURI.
    ///
    /// For example, "/word/_rels/document.xml.rels" for "/word/document.xml" and
    /// "/_rels/.rels" for the package itself.
    pub fn rels_uri(&self) -> PackURI {
        let base_uri = self.base_uri();
        let uri = if base_uri == "/" {
            format!("/_rels/{}.rels", self.filename())
        } else {
            format!("{}/_rels/{}.rels", base_uri, self.filename())
        };
        PackURI { uri }
    }

    /// Get the source PackURI that a .rels part describes.
    ///
    /// The inverse of [`PackURI::rels_uri`]: "/word/_rels/document.xml.rels" gives
    /// "/word/document.xml" and "/_rels/.rels" gives the package URI "/".
    /// Returns `None` for URIs that are not relationship parts.
    pub fn rels_source(&self) -> Option<PackURI> {
        let filename = self.filename().strip_suffix(".rels")?;
        let rels_dir = self.base_uri();
        let parent = rels_dir.strip_suffix("_rels")?;
        if !parent.ends_with('/') {
            return None;
        }
        Some(PackURI {
            uri: format!("{}{}", parent, filename),
        })
    }

    /// Get the full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Helper function to join two paths using forward slashes
    fn join_paths(base: &str, rel: &str) -> String {
        if base.ends_with('/') {
            format!("{}{}", base, rel)
        } else {
            format!("{}/{}", base, rel)
        }
    }

    /// Helper function to normalize a path (resolve ".." and ".")
    fn normalize_path(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();

        for part in path.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }

        format!("/{}", parts.join("/"))
    }
}

/// Decode `%XX` escapes; a target that does not decode to UTF-8 is kept as-is.
fn percent_decode(s: &str) -> Cow<'_, str> {
    urlencoding::decode(s).unwrap_or(Cow::Borrowed(s))
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";
