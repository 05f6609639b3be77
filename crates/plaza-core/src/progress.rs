//! Aggregate progress derivation.
//!
//! Pure functions over per-file states, no I/O. The poller and the UI both
//! derive job-level status from the same rules, so the invariants live in
//! one place.

use crate::models::{FileStatus, FileUploadState, UploadStatus};

/// Job-level view derived from the set of per-file states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobAggregate {
    pub overall_progress: u8,
    pub status: UploadStatus,
}

/// Derive aggregate status and percentage from per-file states.
///
/// The percentage is the unweighted mean of per-file percents,
/// `round(sum / n)`. File-size weighting is deliberately not attempted: the
/// processing service only reports a coarse per-file percent, so a weighted
/// figure would be no more truthful.
///
/// Status rules:
/// - every file `Completed` -> `Completed`
/// - at least one `Failed` and none in flight -> `Failed`
/// - otherwise -> `Processing`
/// - zero files -> `Completed` at 100 (the no-attachments fast path)
pub fn aggregate<'a, I>(files: I) -> JobAggregate
where
    I: IntoIterator<Item = &'a FileUploadState>,
{
    let mut total: u64 = 0;
    let mut count: u32 = 0;
    let mut completed: u32 = 0;
    let mut failed: u32 = 0;
    let mut in_flight: u32 = 0;

    for file in files {
        count += 1;
        total += u64::from(file.progress_percent.min(100));
        match file.status {
            FileStatus::Completed => completed += 1,
            FileStatus::Failed => failed += 1,
            _ => in_flight += 1,
        }
    }

    if count == 0 {
        return JobAggregate {
            overall_progress: 100,
            status: UploadStatus::Completed,
        };
    }

    let overall_progress = ((total as f64) / (count as f64)).round() as u8;
    let status = if completed == count {
        UploadStatus::Completed
    } else if failed > 0 && in_flight == 0 {
        UploadStatus::Failed
    } else {
        UploadStatus::Processing
    };

    JobAggregate {
        overall_progress,
        status,
    }
}

/// Number of files that have reached `Completed`.
pub fn completed_files<'a, I>(files: I) -> u32
where
    I: IntoIterator<Item = &'a FileUploadState>,
{
    files
        .into_iter()
        .filter(|f| f.status == FileStatus::Completed)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn file(status: FileStatus, progress: u8) -> FileUploadState {
        FileUploadState {
            file_id: Uuid::new_v4(),
            file_name: "f.jpg".to_string(),
            size_bytes: 1,
            mime_type: "image/jpeg".to_string(),
            status,
            progress_percent: progress,
            result_url: None,
            thumbnail_url: None,
            error_message: None,
        }
    }

    #[test]
    fn test_empty_job_fast_path() {
        let agg = aggregate(std::iter::empty());
        assert_eq!(agg.overall_progress, 100);
        assert_eq!(agg.status, UploadStatus::Completed);
    }

    #[test]
    fn test_mean_is_rounded() {
        let files = [
            file(FileStatus::Uploading, 10),
            file(FileStatus::Uploading, 25),
        ];
        // (10 + 25) / 2 = 17.5 -> 18
        assert_eq!(aggregate(files.iter()).overall_progress, 18);

        let files = [
            file(FileStatus::Uploading, 10),
            file(FileStatus::Uploading, 24),
        ];
        // (10 + 24) / 2 = 17
        assert_eq!(aggregate(files.iter()).overall_progress, 17);
    }

    #[test]
    fn test_all_completed_is_completed() {
        let files = [
            file(FileStatus::Completed, 100),
            file(FileStatus::Completed, 100),
            file(FileStatus::Completed, 100),
        ];
        let agg = aggregate(files.iter());
        assert_eq!(agg.status, UploadStatus::Completed);
        assert_eq!(agg.overall_progress, 100);
    }

    #[test]
    fn test_failure_with_files_in_flight_stays_processing() {
        // A per-file failure never fails the job while others are still
        // in progress; already-completed results must be preserved.
        let files = [
            file(FileStatus::Failed, 30),
            file(FileStatus::Watermarking, 80),
        ];
        assert_eq!(aggregate(files.iter()).status, UploadStatus::Processing);
    }

    #[test]
    fn test_failure_with_no_files_in_flight_is_failed() {
        let files = [
            file(FileStatus::Completed, 100),
            file(FileStatus::Completed, 100),
            file(FileStatus::Failed, 45),
        ];
        let agg = aggregate(files.iter());
        assert_eq!(agg.status, UploadStatus::Failed);
        // (100 + 100 + 45) / 3 = 81.67 -> 82
        assert_eq!(agg.overall_progress, 82);
    }

    #[test]
    fn test_queued_only_is_processing_at_zero() {
        let files = [file(FileStatus::Queued, 0), file(FileStatus::Queued, 0)];
        let agg = aggregate(files.iter());
        assert_eq!(agg.status, UploadStatus::Processing);
        assert_eq!(agg.overall_progress, 0);
    }

    #[test]
    fn test_out_of_range_percent_is_clamped() {
        let files = [file(FileStatus::Uploading, 250)];
        assert_eq!(aggregate(files.iter()).overall_progress, 100);
    }

    #[test]
    fn test_completed_files_count() {
        let files = [
            file(FileStatus::Completed, 100),
            file(FileStatus::Failed, 10),
            file(FileStatus::Completed, 100),
            file(FileStatus::Queued, 0),
        ];
        assert_eq!(completed_files(files.iter()), 2);
    }
}
