use super::{ClientContext, SubClient};
use crate::errors::OpencgaError;
use crate::models::RestResponse;
use crate::query::{LogicalQuery, Method, Params, FILE};
use serde_json::Value;
use std::path::{Path, PathBuf};

const FILES: &str = "files";

/// Files: upload, download, search, and deletion of files in the catalog.
pub struct FileClient {
    context: ClientContext,
}

impl SubClient for FileClient {
    fn new(context: ClientContext) -> Self {
        Self { context }
    }

    fn context(&self) -> &ClientContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ClientContext {
        &mut self.context
    }
}

impl FileClient {
    /// Upload a local file. Other parameters, e.g. `study` and
    /// `relativeFilePath`, are sent as form fields.
    pub fn upload(
        &self,
        local_file: &Path,
        params: Params,
    ) -> Result<RestResponse<Value>, OpencgaError> {
        let query = LogicalQuery::new(FILES, "upload", Method::Upload)
            .params(params)
            .param(FILE, local_file.to_string_lossy().into_owned());
        self.context.execute(query)
    }

    pub fn search(&self, params: Params) -> Result<RestResponse<Value>, OpencgaError> {
        self.context
            .execute(LogicalQuery::get(FILES, "search").params(params))
    }

    /// Get files by comma-separated IDs.
    pub fn info(&self, files: &str, params: Params) -> Result<RestResponse<Value>, OpencgaError> {
        self.context
            .execute(LogicalQuery::get(FILES, "info").id(files).params(params))
    }

    /// Download a file's content to `destination`. If `destination` is a
    /// directory, the file keeps its name inside it. Returns the path
    /// written to.
    pub fn download(
        &self,
        file: &str,
        destination: &Path,
        params: Params,
    ) -> Result<PathBuf, OpencgaError> {
        let destination = download_destination(file, destination)?;
        let query = LogicalQuery::new(FILES, "download", Method::Download)
            .id(file)
            .params(params);
        self.context.download(query, &destination)?;
        Ok(destination)
    }

    pub fn delete(&self, files: &str, params: Params) -> Result<RestResponse<Value>, OpencgaError> {
        let query = LogicalQuery::new(FILES, "delete", Method::Delete)
            .id(files)
            .params(params);
        self.context.execute(query)
    }
}

/// Local path of a download. Catalog paths use `:` as separator, so the
/// file name is what follows the last `:` or `/`.
fn download_destination(file: &str, destination: &Path) -> Result<PathBuf, OpencgaError> {
    if destination.is_dir() {
        let name = file
            .rsplit(|c: char| c == ':' || c == '/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OpencgaError::client(format!("no file name in \"{}\"", file)))?;
        return Ok(destination.join(name));
    }
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(
            OpencgaError::client(format!("output directory {:?} not found", parent)),
        ),
        _ => Ok(destination.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tempfile::TempDir;

    #[rstest]
    #[case("data:a.vcf", "a.vcf")]
    #[case("a.vcf", "a.vcf")]
    #[case("data/b.bam", "b.bam")]
    fn test_download_into_directory(#[case] file: &str, #[case] name: &str) {
        let tmp_dir = TempDir::new().unwrap();
        let destination = download_destination(file, tmp_dir.path()).unwrap();
        assert_eq!(destination, tmp_dir.path().join(name));
    }

    #[rstest]
    fn test_download_to_file_path() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("renamed.vcf");
        assert_eq!(download_destination("data:a.vcf", &path).unwrap(), path);
    }

    #[rstest]
    fn test_download_missing_directory() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("absent").join("a.vcf");
        let err = download_destination("data:a.vcf", &path).unwrap_err();
        assert!(matches!(err, OpencgaError::Client(_)));
    }

    #[rstest]
    fn test_download_into_directory_needs_a_name() {
        let tmp_dir = TempDir::new().unwrap();
        let err = download_destination("data:", tmp_dir.path()).unwrap_err();
        assert!(matches!(err, OpencgaError::Client(_)));
    }
}
