use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::{Builder, NamedTempFile};

use super::encoding::Encoding;
use super::path::{PathGuard, ResolvedPath};
use super::request::{Operation, ReadMode, ReadOptions, ToolRequest, WriteMode, WriteOptions};
use super::result::{Content, ExistsReport, FileContent, FileStat, ToolOutput, ToolResult, WriteReport};
use crate::config::GatewayConfig;
use crate::error::{ConfigError, ErrorKind, ToolError, ToolOutcome};

const RUNNING: u8 = 0;
const COMMITTED: u8 = 1;
const ABANDONED: u8 = 2;

/// Point in time after which a running operation gives up, plus a claim
/// shared with whoever waits for the operation.
///
/// Checked between chunks. A write calls [`Deadline::commit`] right before it
/// publishes; a waiter that stops waiting calls [`Deadline::abandon`]. Only one
/// of the two can win, so an abandoned write never becomes visible and a
/// committed one is always reported.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    at: Option<Instant>,
    claim: Arc<AtomicU8>,
}

impl Deadline {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
            claim: Arc::default(),
        }
    }

    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::none, Self::after)
    }

    pub fn expired(&self) -> bool {
        self.at.map_or(false, |at| Instant::now() >= at)
            || self.claim.load(Ordering::Acquire) == ABANDONED
    }

    pub fn check(&self) -> io::Result<()> {
        if self.expired() {
            Err(timed_out())
        } else {
            Ok(())
        }
    }

    /// Claim the right to publish. Fails once expired or abandoned.
    pub fn commit(&self) -> io::Result<()> {
        self.check()?;
        match self
            .claim
            .compare_exchange(RUNNING, COMMITTED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) | Err(COMMITTED) => Ok(()),
            Err(_) => Err(timed_out()),
        }
    }

    /// Give up on the operation. Returns false when it already committed,
    /// in which case its result must be awaited.
    pub fn abandon(&self) -> bool {
        match self
            .claim
            .compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) | Err(ABANDONED) => true,
            Err(_) => false,
        }
    }
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "operation timed out")
}

/// File tool gateway: validated, sandboxed file operations for tool calls.
///
/// Every operation resolves its path through the [`PathGuard`] first and
/// reports failures as [`ToolError`]s; nothing here panics on caller input.
/// Concurrent writers to the same path are not coordinated: the last rename
/// wins.
#[derive(Debug, Clone)]
pub struct FileGateway {
    config: Arc<GatewayConfig>,
    guard: PathGuard,
}

impl FileGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<GatewayConfig>) -> Result<Self, ConfigError> {
        config.validate()?;
        let guard = PathGuard::new(&config.allowed_roots)?;
        Ok(Self { config, guard })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    pub fn resolve(&self, raw_path: &str) -> ToolOutcome<ResolvedPath> {
        self.guard.resolve(raw_path)
    }

    /// Execute a request with the configured timeout
    pub fn execute(&self, request: &ToolRequest) -> ToolResult {
        self.execute_with_deadline(request, Deadline::from_timeout(self.config.timeout()))
    }

    pub fn execute_with_deadline(&self, request: &ToolRequest, deadline: Deadline) -> ToolResult {
        debug!("Executing {} on '{}'", request.tool_name(), request.path);

        let outcome = match &request.operation {
            Operation::Read(options) => self
                .read_file(&request.path, options, deadline)
                .map(ToolOutput::Content),
            Operation::Write(options) => self
                .write_file(&request.path, options, deadline)
                .map(ToolOutput::Written),
            Operation::Exists => self.exists(&request.path).map(ToolOutput::Exists),
            Operation::Stat => self.stat(&request.path).map(ToolOutput::Stat),
        };

        if let Err(e) = &outcome {
            warn!("{} '{}' failed: {}", request.tool_name(), request.path, e);
        }
        outcome.into()
    }

    /// Read a window of a file.
    ///
    /// The limit applies to the bytes actually returned: the window size,
    /// taken from metadata before anything is read, is checked against
    /// `max_read_bytes`. Without `offset`/`length` that is the file size; a
    /// windowed read of a larger file succeeds as long as the window fits.
    /// `length` past EOF is clamped.
    pub fn read_file(
        &self,
        raw_path: &str,
        options: &ReadOptions,
        deadline: Deadline,
    ) -> ToolOutcome<FileContent> {
        let path = self.guard.resolve(raw_path)?;
        let encoding = options.encoding.unwrap_or(self.config.default_encoding);
        let context = || format!("Failed to read file '{}'", raw_path);

        let metadata = fs::metadata(&path).map_err(|e| ToolError::from_io(&e, context()))?;
        if metadata.is_dir() {
            return Err(ToolError::invalid_input(format!(
                "'{}' is a directory",
                raw_path
            )));
        }

        let file_size = metadata.len();
        let offset = options.offset.unwrap_or(0);
        let available = file_size.saturating_sub(offset);
        let window = options.length.map_or(available, |length| length.min(available));

        if window > self.config.max_read_bytes {
            return Err(ToolError::too_large(format!(
                "Reading '{}' needs {} bytes, limit is {}",
                raw_path, window, self.config.max_read_bytes
            )));
        }

        let mut file = File::open(&path).map_err(|e| ToolError::from_io(&e, context()))?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| ToolError::from_io(&e, context()))?;
        }
        let bytes = read_window(&mut file, window, self.config.chunk_size, &deadline)
            .map_err(|e| ToolError::from_io(&e, context()))?;

        let content = match (encoding, options.mode) {
            (Encoding::Binary, _) => Content::Base64(encoding.decode(&bytes)?),
            (_, ReadMode::All) => Content::Text(encoding.decode(&bytes)?),
            (_, ReadMode::Lines) => Content::Lines(
                encoding
                    .decode(&bytes)?
                    .split_inclusive('\n')
                    .map(str::to_string)
                    .collect(),
            ),
        };

        debug!("Read {} bytes from '{}'", bytes.len(), path);
        Ok(FileContent {
            path: path.to_string(),
            encoding,
            offset,
            bytes_read: bytes.len() as u64,
            file_size,
            content,
        })
    }

    /// Write or append content.
    ///
    /// Overwrite stages the content in a temp file next to the target and
    /// renames it into place. Append writes in place and rolls back to the
    /// original length on failure.
    pub fn write_file(
        &self,
        raw_path: &str,
        options: &WriteOptions,
        deadline: Deadline,
    ) -> ToolOutcome<WriteReport> {
        let path = self.guard.resolve(raw_path)?;
        let encoding = options.encoding.unwrap_or(self.config.default_encoding);
        let bytes = encoding.encode(&options.content)?;

        if bytes.len() as u64 > self.config.max_write_bytes {
            return Err(ToolError::too_large(format!(
                "Content for '{}' is {} bytes, limit is {}",
                raw_path,
                bytes.len(),
                self.config.max_write_bytes
            )));
        }

        let context = || format!("Failed to write to file '{}'", raw_path);
        let parent = path
            .parent()
            .ok_or_else(|| ToolError::invalid_input(format!("'{}' has no parent directory", raw_path)))?;

        if !parent.is_dir() {
            if options.create_dirs {
                debug!("Creating directories for '{}'", path);
                fs::create_dir_all(parent).map_err(|e| {
                    ToolError::from_io(&e, format!("Failed to create directories for '{}'", raw_path))
                })?;
            } else {
                return Err(ToolError::not_found(format!(
                    "Parent directory of '{}' does not exist",
                    raw_path
                )));
            }
        }

        let existing = match fs::metadata(&path) {
            Ok(metadata) => Some(metadata),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(ToolError::from_io(&e, context())),
        };
        if let Some(metadata) = &existing {
            if metadata.is_dir() {
                return Err(ToolError::invalid_input(format!(
                    "'{}' is a directory",
                    raw_path
                )));
            }
            if metadata.permissions().readonly() {
                return Err(ToolError::new(
                    ErrorKind::PermissionDenied,
                    format!("{}: file is read-only", context()),
                ));
            }
        }

        let chunk_size = self.config.chunk_size;
        let write = |file: &mut File| write_chunks(file, &bytes, chunk_size, &deadline);
        let written = match options.mode {
            WriteMode::Overwrite => {
                replace_atomically(path.as_path(), parent, existing.as_ref(), &deadline, write)
            }
            WriteMode::Append => append_all(path.as_path(), existing.is_none(), &deadline, write),
        };
        written.map_err(|e| ToolError::from_io(&e, context()))?;

        debug!("Wrote {} bytes to '{}' ({:?})", bytes.len(), path, options.mode);
        Ok(WriteReport {
            path: path.to_string(),
            bytes_written: bytes.len() as u64,
            mode: options.mode,
            created: existing.is_none(),
        })
    }

    /// Report whether a path exists. Absence is a successful answer; only
    /// invalid or escaping paths fail.
    pub fn exists(&self, raw_path: &str) -> ToolOutcome<ExistsReport> {
        match self.guard.resolve(raw_path) {
            Ok(path) => Ok(ExistsReport {
                exists: fs::metadata(&path).is_ok(),
                path: path.to_string(),
            }),
            Err(e) if matches!(e.kind, ErrorKind::InvalidInput | ErrorKind::PathTraversal) => Err(e),
            Err(e) => {
                debug!("Treating '{}' as absent: {}", raw_path, e);
                Ok(ExistsReport {
                    path: raw_path.to_string(),
                    exists: false,
                })
            }
        }
    }

    pub fn stat(&self, raw_path: &str) -> ToolOutcome<FileStat> {
        let path = self.guard.resolve(raw_path)?;
        let metadata = fs::metadata(&path)
            .map_err(|e| ToolError::from_io(&e, format!("Failed to stat '{}'", raw_path)))?;
        let modified: Option<DateTime<Utc>> = metadata.modified().ok().map(DateTime::from);

        Ok(FileStat {
            path: path.to_string(),
            size: metadata.len(),
            modified: modified.map(|t| t.to_rfc3339()),
            modified_unix: modified.map(|t| t.timestamp()),
            is_dir: metadata.is_dir(),
            is_file: metadata.is_file(),
            readonly: metadata.permissions().readonly(),
        })
    }
}

/// Read at most `window` bytes in `chunk_size` pieces
fn read_window<R: Read>(
    reader: R,
    window: u64,
    chunk_size: usize,
    deadline: &Deadline,
) -> io::Result<Vec<u8>> {
    let mut limited = reader.take(window);
    let mut buffer = Vec::with_capacity(usize::try_from(window).unwrap_or(0));
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        deadline.check()?;
        match limited.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(buffer)
}

fn write_chunks<W: Write>(
    writer: &mut W,
    bytes: &[u8],
    chunk_size: usize,
    deadline: &Deadline,
) -> io::Result<()> {
    for chunk in bytes.chunks(chunk_size.max(1)) {
        deadline.check()?;
        writer.write_all(chunk)?;
    }
    writer.flush()
}

/// Temp file in `parent`. New files get the usual 0666 & !umask mode
/// instead of tempfile's private 0600.
fn stage_in(parent: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(parent)
}

/// Stage content in a temp file in `parent` and rename it over `path`.
/// The temp file is removed on every failure path when it is dropped.
fn replace_atomically<F>(
    path: &Path,
    parent: &Path,
    existing: Option<&Metadata>,
    deadline: &Deadline,
    write: F,
) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut staged = stage_in(parent)?;
    write(staged.as_file_mut())?;
    staged.as_file().sync_all()?;

    if let Some(metadata) = existing {
        fs::set_permissions(staged.path(), metadata.permissions())?;
    }

    deadline.commit()?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append the whole buffer or leave the file as it was
fn append_all<F>(path: &Path, created: bool, deadline: &Deadline, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    deadline.check()?;
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    let original_len = file.metadata()?.len();

    let outcome = write(&mut file)
        .and_then(|_| file.sync_data())
        .and_then(|_| deadline.commit());
    if let Err(e) = outcome {
        let rollback = if created {
            fs::remove_file(path)
        } else {
            file.set_len(original_len).and_then(|_| file.sync_data())
        };
        if let Err(rollback_err) = rollback {
            warn!(
                "Failed to roll back partial append to '{}': {}",
                path.display(),
                rollback_err
            );
        }
        return Err(e);
    }
    Ok(())
}
