//! Job procedures executed on the worker lanes

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use super::LoaderShared;
use crate::codec;
use crate::error::{AssetError, Result};
use crate::job::{JobEvent, JobEventKind, JobKind, JobOutcome, JobResult, JobTicket, Preview};
use crate::route::{encoding, RouteRequest};

/// Run one job to completion and report it
pub(crate) fn run(shared: &LoaderShared, job: JobTicket, events: &Sender<JobEvent>) {
    let _lane = shared.lane(job.kind).lock();

    if !shared.generations.is_current(job.kind, job.generation) {
        log::debug!(
            "Skipping superseded {:?} job for {}",
            job.kind,
            job.target.display()
        );
        return;
    }

    publish(events, JobEvent::new(&job, JobEventKind::Started));

    let result = panic::catch_unwind(AssertUnwindSafe(|| match job.kind {
        JobKind::RouteLoad => load_route(shared, &job),
        JobKind::PackagePreview => load_package(shared, &job),
    }));

    let outcome = match result {
        Ok(Ok(result)) => JobOutcome::Processed(result),
        Ok(Err(err)) => {
            log::error!("Loading {} failed: {err}", job.target.display());
            JobOutcome::Failed(Arc::new(err))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("Worker panicked on {}: {message}", job.target.display());
            JobOutcome::Failed(Arc::new(AssetError::WorkerPanicked {
                path: job.target.clone(),
                message,
            }))
        }
    };

    publish(events, JobEvent::new(&job, JobEventKind::Finished(outcome)));
}

fn publish(events: &Sender<JobEvent>, event: JobEvent) {
    if events.send(event).is_err() {
        log::debug!("Job events receiver dropped; discarding notification");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn ensure_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AssetError::MissingFile {
            path: path.to_path_buf(),
        })
    }
}

fn load_route(shared: &LoaderShared, job: &JobTicket) -> Result<JobResult> {
    let path = &job.target;
    ensure_file(path)?;

    let text_encoding = encoding::detect_file(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AssetError::MissingFile { path: path.clone() },
        _ => AssetError::Io(e),
    })?;

    let parser = shared
        .parsers
        .resolve(path)
        .ok_or_else(|| AssetError::NoCapableParser { path: path.clone() })?;

    let request = RouteRequest::for_file(path, text_encoding);
    log::debug!(
        "Parsing {} with {} ({:?}, objects in {})",
        path.display(),
        parser.name(),
        text_encoding,
        request.object_folder.display()
    );
    let scene = Arc::new(parser.load(&request).map_err(AssetError::ParserFailure)?);

    let installed = shared.scene.replace_if(Arc::clone(&scene), || {
        shared.generations.is_current(job.kind, job.generation)
    });
    if !installed {
        log::debug!("Parsed {} after it was superseded", path.display());
    }

    let named = scene
        .image
        .as_deref()
        .filter(|image| !image.as_os_str().is_empty())
        .map(|image| resolve_relative(path, image));
    let preview = match named {
        Some(image) if image.is_file() => decode_preview(shared, &image),
        Some(image) => {
            log::debug!("Route image {} does not exist", image.display());
            Preview::Unknown
        }
        None => sibling_preview(shared, path),
    };

    let comment = normalize_newlines(&scene.comment);
    let text = if comment.is_empty() {
        file_stem(path)
    } else {
        comment
    };

    Ok(JobResult { preview, text })
}

fn load_package(shared: &LoaderShared, job: &JobTicket) -> Result<JobResult> {
    let path = &job.target;
    let reader = shared
        .packages
        .as_ref()
        .ok_or_else(|| AssetError::NoPackageReader { path: path.clone() })?;
    ensure_file(path)?;

    let package = reader
        .read_package(path)
        .map_err(AssetError::ParserFailure)?;

    let preview = match package.image.as_deref() {
        Some(bytes) => match codec::decode_bytes(bytes) {
            Ok(image) => Preview::Image(Arc::new(image)),
            Err(e) => {
                log::warn!("Preview image of package {} is unusable: {e}", path.display());
                Preview::Unknown
            }
        },
        None => Preview::Unknown,
    };

    let description = normalize_newlines(&package.description);
    let text = if description.is_empty() {
        package.name
    } else {
        description
    };

    Ok(JobResult { preview, text })
}

/// First `<stem><ext>` next to the route file, in configured priority order
fn sibling_preview(shared: &LoaderShared, route: &Path) -> Preview {
    let dir = route.parent().unwrap_or(Path::new(""));
    let stem = file_stem(route);

    shared
        .config
        .preview_extensions
        .iter()
        .map(|ext| dir.join(format!("{stem}{ext}")))
        .find(|candidate| candidate.is_file())
        .map(|candidate| decode_preview(shared, &candidate))
        .unwrap_or(Preview::Unknown)
}

fn decode_preview(shared: &LoaderShared, path: &Path) -> Preview {
    match shared.cache.get_or_decode(path) {
        Ok(image) => Preview::Image(image),
        Err(e) => {
            log::warn!("Preview image {} is unusable: {e}", path.display());
            Preview::Unknown
        }
    }
}

fn resolve_relative(route: &Path, image: &Path) -> PathBuf {
    if image.is_absolute() {
        image.to_path_buf()
    } else {
        route.parent().unwrap_or(Path::new("")).join(image)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Convert any mix of CRLF, CR and LF to the platform line ending
fn normalize_newlines(text: &str) -> String {
    let unix = text.replace("\r\n", "\n").replace('\r', "\n");
    if cfg!(windows) {
        unix.replace('\n', "\r\n")
    } else {
        unix
    }
}
