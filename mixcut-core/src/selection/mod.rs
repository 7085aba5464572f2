// ============================================================================
// mixcut-core/src/selection/mod.rs
// ============================================================================
//
// CLIP SELECTOR: Coverage-Driven Candidate Selection
//
// Given a clip source and a narration target, the selector walks candidates
// in source order, rejects unusable files (failed probe, wrong orientation,
// below minimum length), clamps overlong ones, and accumulates a
// transition-compensated running total until the target is covered. When
// the primary pool runs out first, a stock-footage provider is queried for
// the shortfall. A deficit that survives the fallback ladder is a fatal
// `SelectionExhausted`, never a silent truncation.
//
// Each candidate is probed and copied into the job working directory under
// an advisory lock so parallel scene workers never collide on one source.

use crate::config::MixConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::MediaProber;
use crate::timeline::TIME_EPSILON;
use std::fs;
use std::path::{Path, PathBuf};

/// Advisory per-source-file locking.
pub mod lock;

/// Secondary stock-footage pool.
pub mod stock;

pub use lock::SourceLock;
pub use stock::{resolve_provider, PexelsProvider, StockFootageProvider};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// A selected clip with its effective (clamp-aware) duration.
#[derive(Debug, Clone)]
pub struct Clip {
    /// Private copy inside the job working directory.
    pub path: PathBuf,
    /// Effective duration the clip contributes after clamping/trim-to-fit.
    pub duration: f64,
    /// Intrinsic duration of the source (images report the configured
    /// default).
    pub source_duration: f64,
    pub width: u32,
    pub height: u32,
    pub is_image: bool,
}

/// Ordered selection result with the transition-compensated total.
#[derive(Debug, Clone)]
pub struct Selection {
    pub clips: Vec<Clip>,
    pub effective_total: f64,
}

/// Coverage-driven clip selector.
pub struct ClipSelector<'a, P: MediaProber> {
    config: &'a MixConfig,
    prober: &'a P,
    stock: Option<&'a dyn StockFootageProvider>,
}

impl<'a, P: MediaProber> ClipSelector<'a, P> {
    pub fn new(config: &'a MixConfig, prober: &'a P) -> Self {
        ClipSelector {
            config,
            prober,
            stock: None,
        }
    }

    /// Injects the secondary pool queried on primary exhaustion.
    pub fn with_stock(mut self, provider: &'a dyn StockFootageProvider) -> Self {
        self.stock = Some(provider);
        self
    }

    /// Selects clips from `source_dir` until the transition-compensated
    /// total reaches `target_secs`.
    ///
    /// `is_head` marks the first scene of a job: its first clip contributes
    /// its full duration, while every later clip (and the first clip of a
    /// non-head scene, which crossfades into the previous scene) gives up
    /// the transition overlap.
    pub fn select(
        &self,
        source_dir: &Path,
        query: &str,
        target_secs: f64,
        work_dir: &Path,
        is_head: bool,
    ) -> CoreResult<Selection> {
        let candidates = list_candidates(source_dir)?;
        log::debug!(
            "selecting from {} candidates in {} for a {target_secs:.1}s target",
            candidates.len(),
            source_dir.display()
        );

        let mut clips: Vec<Clip> = Vec::new();
        let mut total = 0.0;

        for candidate in &candidates {
            if total + TIME_EPSILON >= target_secs {
                break;
            }
            match self.consider(candidate, clips.len(), work_dir) {
                Ok(Some(clip)) => {
                    total += self.contribution(clip.duration, clips.is_empty(), is_head);
                    log::debug!(
                        "accepted {} ({:.1}s effective, running total {total:.1}s)",
                        clip.path.display(),
                        clip.duration
                    );
                    clips.push(clip);
                }
                Ok(None) => {}
                Err(CoreError::LockTimeout(path)) => {
                    // Retryable at caller discretion; here another candidate
                    // substitutes for the locked one.
                    log::warn!("skipping locked candidate: {}", path.display());
                }
                Err(err) => return Err(err),
            }
        }

        if total + TIME_EPSILON < target_secs {
            total = self.select_from_stock(query, target_secs, total, &mut clips, work_dir, is_head)?;
        }

        if clips.is_empty() {
            return Err(CoreError::NoClipsFound);
        }
        if total + TIME_EPSILON < target_secs {
            return Err(CoreError::SelectionExhausted {
                shortfall_secs: target_secs - total,
            });
        }

        Ok(Selection {
            clips,
            effective_total: total,
        })
    }

    /// Effective contribution of one clip to the running total.
    fn contribution(&self, duration: f64, is_first: bool, is_head: bool) -> f64 {
        if is_first && is_head {
            duration
        } else {
            duration - self.config.transition_overlap()
        }
    }

    /// Probes one candidate under its source lock and copies it into the
    /// working directory when it passes every gate.
    fn consider(
        &self,
        candidate: &Path,
        index: usize,
        work_dir: &Path,
    ) -> CoreResult<Option<Clip>> {
        let is_image = has_extension(candidate, IMAGE_EXTENSIONS);

        let _lock = SourceLock::acquire(candidate, self.config.lock_timeout)?;

        if is_image {
            let info = match self.prober.media_info(candidate) {
                Ok(info) => info,
                Err(err) => {
                    log::warn!("rejecting unreadable image {}: {err}", candidate.display());
                    return Ok(None);
                }
            };
            let (width, height) = info.dimensions().unwrap_or((0, 0));
            let path = copy_into(candidate, index, work_dir)?;
            return Ok(Some(Clip {
                path,
                duration: self.config.image_duration_secs,
                source_duration: self.config.image_duration_secs,
                width,
                height,
                is_image: true,
            }));
        }

        if let Err(err) = self.prober.verify(candidate) {
            // ProbeInvalid is recoverable here: the next candidate
            // substitutes for this one.
            log::warn!("rejecting candidate {}: {err}", candidate.display());
            return Ok(None);
        }

        let info = self.prober.media_info(candidate)?;
        let Some(source_duration) = info.duration else {
            log::warn!("no duration reported for {}", candidate.display());
            return Ok(None);
        };
        let Some((width, height)) = info.dimensions() else {
            log::warn!("no video dimensions reported for {}", candidate.display());
            return Ok(None);
        };

        if !self.config.orientation.matches(width, height) {
            log::debug!(
                "orientation mismatch for {} ({width}x{height})",
                candidate.display()
            );
            return Ok(None);
        }
        if source_duration < self.config.clip_min_secs {
            log::debug!(
                "{} is below the minimum clip length ({source_duration:.1}s)",
                candidate.display()
            );
            return Ok(None);
        }

        // Clamp now for accounting; the normalizer trims the media later.
        let duration = source_duration.min(self.config.clip_max_secs);

        let path = copy_into(candidate, index, work_dir)?;
        Ok(Some(Clip {
            path,
            duration,
            source_duration,
            width,
            height,
            is_image: false,
        }))
    }

    /// Fallback ladder step (a): query the stock provider for the shortfall
    /// and trim returned clips to fit. Returns the updated running total.
    fn select_from_stock(
        &self,
        query: &str,
        target_secs: f64,
        mut total: f64,
        clips: &mut Vec<Clip>,
        work_dir: &Path,
        is_head: bool,
    ) -> CoreResult<f64> {
        let Some(provider) = self.stock else {
            return Ok(total);
        };
        let shortfall = target_secs - total;
        log::info!("primary pool exhausted {shortfall:.1}s short; querying stock provider");

        let fetched = match self
            .config
            .retry
            .run("stock footage fetch", || provider.fetch(query, shortfall, work_dir))
        {
            Ok(paths) => paths,
            Err(err) => {
                log::error!("stock provider failed: {err}");
                return Ok(total);
            }
        };

        for path in fetched {
            if total + TIME_EPSILON >= target_secs {
                break;
            }
            if let Err(err) = self.prober.verify(&path) {
                log::warn!("rejecting stock clip {}: {err}", path.display());
                continue;
            }
            let info = self.prober.media_info(&path)?;
            let Some(source_duration) = info.duration else {
                continue;
            };
            if source_duration < self.config.clip_min_secs {
                continue;
            }
            let (width, height) = info.dimensions().unwrap_or((0, 0));

            // Trim to what the shortfall still needs, respecting bounds.
            let overlap = if clips.is_empty() && is_head {
                0.0
            } else {
                self.config.transition_overlap()
            };
            let needed = target_secs - total + overlap;
            let mut duration = source_duration.min(self.config.clip_max_secs);
            if duration > needed {
                duration = needed.max(self.config.clip_min_secs);
            }

            total += self.contribution(duration, clips.is_empty(), is_head);
            clips.push(Clip {
                path,
                duration,
                source_duration,
                width,
                height,
                is_image: false,
            });
        }
        Ok(total)
    }
}

/// Lists usable media files in source order (sorted directory listing).
fn list_candidates(source_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    if !source_dir.is_dir() {
        return Err(CoreError::PathError(format!(
            "clip source is not a directory: {}",
            source_dir.display()
        )));
    }
    let mut candidates: Vec<PathBuf> = fs::read_dir(source_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && (has_extension(path, VIDEO_EXTENSIONS) || has_extension(path, IMAGE_EXTENSIONS))
        })
        .collect();
    candidates.sort();
    Ok(candidates)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Copies a candidate into the job working directory. Runs under the
/// candidate's source lock.
fn copy_into(candidate: &Path, index: usize, work_dir: &Path) -> CoreResult<PathBuf> {
    let file_name = candidate
        .file_name()
        .ok_or_else(|| CoreError::PathError(format!("no file name: {}", candidate.display())))?;
    let dest = work_dir.join(format!("{index:03}_{}", file_name.to_string_lossy()));
    fs::copy(candidate, &dest)?;
    Ok(dest)
}
