// ============================================================================
// mixcut-core/src/pipeline.rs
// ============================================================================
//
// JOB PIPELINE: Per-Scene Orchestration
//
// One job turns a list of narrated scenes into one published video. Scene
// workers run in parallel (selection + normalization only touch their own
// working subdirectory and the advisory-locked sources); the event mapping,
// timeline accounting, overlay substitution and final assembly then run
// sequentially in dependency order. A stage failure fails the whole job;
// nothing is published before assembly verification succeeds.

use crate::alignment::{self, AlignedSegment};
use crate::annotation::events::{map_event, reconcile, AnnotationEvent, PriorEvent};
use crate::annotation::{find_tag, parse_tags, strip_tags, AnnotationKind};
use crate::assets::{OverlayResolver, SoundEffectResolver};
use crate::assembly::Assembler;
use crate::audio;
use crate::config::MixConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg::SidecarSpawner;
use crate::external::{check_dependency, CrateFfprobeProber};
use crate::normalize::{NormalizedClip, Normalizer};
use crate::selection::{ClipSelector, StockFootageProvider};
use crate::temp_files;
use crate::timeline::Timeline;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;

/// One narration unit of a job.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Script text, possibly carrying inline annotation tags.
    pub text: String,
    /// Prerendered narration audio for this scene.
    pub narration: PathBuf,
    /// Primary clip pool for this scene.
    pub clip_dir: PathBuf,
    /// Stock-footage query used when the primary pool falls short.
    pub query: String,
}

/// A complete assembly job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub scenes: Vec<Scene>,
    /// File name of the published artifact; generated when unset.
    pub output_name: Option<String>,
}

/// Summary of a finished job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub output: PathBuf,
    pub duration_secs: f64,
    pub scene_count: usize,
    pub clip_count: usize,
    pub subtitles: Option<PathBuf>,
}

/// Per-scene worker output.
struct PreparedScene {
    raw_text: String,
    stripped_text: String,
    narration: PathBuf,
    narration_secs: f64,
    clips: Vec<NormalizedClip>,
}

/// Runs one job end to end and publishes the final artifact.
pub fn process_job(
    config: &MixConfig,
    job: &JobSpec,
    overlays: &dyn OverlayResolver,
    sounds: &dyn SoundEffectResolver,
    stock: Option<&dyn StockFootageProvider>,
) -> CoreResult<JobReport> {
    config.validate()?;
    if job.scenes.is_empty() {
        return Err(CoreError::InvalidConfig(
            "job contains no scenes".to_string(),
        ));
    }
    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;

    let prober = CrateFfprobeProber;
    let spawner = SidecarSpawner;
    let job_dir = temp_files::create_job_dir(config, "mixcut_job")?;
    log::info!(
        "starting job with {} scenes in {}",
        job.scenes.len(),
        job_dir.path().display()
    );

    // Scene workers: selection and normalization, one worker per scene.
    let results: Vec<CoreResult<PreparedScene>> = job
        .scenes
        .par_iter()
        .enumerate()
        .map(|(index, scene)| {
            prepare_scene(config, scene, index, job_dir.path(), &prober, &spawner, stock)
        })
        .collect();
    let mut scenes = Vec::with_capacity(results.len());
    for result in results {
        scenes.push(result?);
    }

    // Alignment segments accumulate across scenes in narration order.
    let texts: Vec<String> = scenes.iter().map(|s| s.stripped_text.clone()).collect();
    let durations: Vec<f64> = scenes.iter().map(|s| s.narration_secs).collect();
    let segments = alignment::segments_from_scenes(&texts, &durations)?;

    let tracks: Vec<PathBuf> = scenes.iter().map(|s| s.narration.clone()).collect();
    let mut narration = audio::concat_narration(&spawner, &tracks, job_dir.path())?;

    // Event mapping: sound effect first, so its physical duration shifts a
    // later overlay anchor in the same scene.
    let mut events: Vec<AnnotationEvent> = Vec::new();
    for (scene, segment) in scenes.iter().zip(&segments) {
        let (scene_events, mixed) = map_scene_events(
            &spawner, &prober, scene, segment, overlays, sounds, &narration,
            job_dir.path(),
        )?;
        narration = mixed;
        events.extend(scene_events);
    }

    // Timeline accounting over every normalized clip in scene order.
    let all_clips: Vec<NormalizedClip> = scenes.into_iter().flat_map(|s| s.clips).collect();
    let clip_count = all_clips.len();
    let timeline = Timeline::build(all_clips);
    timeline.check_invariants()?;
    let narration_total: f64 = durations.iter().sum();
    timeline.ensure_covers(narration_total)?;

    // Crossfades consume overlap from the rendered total.
    let overlap = config.transition_overlap();
    let rendered_total =
        timeline.total_duration() - overlap * (clip_count.saturating_sub(1)) as f64;

    // Align the narration tail to the rendered total with bounded silence.
    let narration_now = audio::duration(&prober, &narration)?;
    narration = audio::align_tail(
        &spawner,
        &narration,
        rendered_total - narration_now,
        config.max_trailing_silence_secs,
        job_dir.path(),
    )?;

    // Overlay substitution feeds the final concatenation.
    let windows = reconcile(&events, &timeline);
    let clips = crate::overlay::apply_overlays(
        &spawner,
        config,
        &timeline,
        &windows,
        job_dir.path(),
    )?;

    let output = config.output_dir.join(
        job.output_name
            .clone()
            .unwrap_or_else(|| format!("mix_{}.mp4", timestamp())),
    );
    let assembler = Assembler::new(config, &spawner, &prober);
    let published = assembler.assemble(&clips, &narration, &output, job_dir.path())?;

    // Subtitles ride along next to the verified artifact.
    let subtitles = write_subtitles(&published, &segments);

    Ok(JobReport {
        output: published,
        duration_secs: rendered_total,
        scene_count: durations.len(),
        clip_count,
        subtitles,
    })
}

/// Scene worker: validates the tag grammar, probes narration length,
/// selects and normalizes clips into the scene's own subdirectory.
fn prepare_scene(
    config: &MixConfig,
    scene: &Scene,
    index: usize,
    job_dir: &std::path::Path,
    prober: &CrateFfprobeProber,
    spawner: &SidecarSpawner,
    stock: Option<&dyn StockFootageProvider>,
) -> CoreResult<PreparedScene> {
    // Reject unsupported multi-tag input before any heavy work.
    parse_tags(&scene.text)?;

    let scene_dir = job_dir.join(format!("scene_{index:02}"));
    fs::create_dir_all(&scene_dir)?;

    let narration_secs = audio::duration(prober, &scene.narration)?;
    log::info!("scene {index}: narration {narration_secs:.2}s");

    let mut selector = ClipSelector::new(config, prober);
    if let Some(provider) = stock {
        selector = selector.with_stock(provider);
    }
    let selection = selector.select(
        &scene.clip_dir,
        &scene.query,
        narration_secs,
        &scene_dir,
        index == 0,
    )?;
    log::info!(
        "scene {index}: selected {} clips covering {:.2}s",
        selection.clips.len(),
        selection.effective_total
    );

    let normalizer = Normalizer::new(config, spawner);
    let mut clips = Vec::with_capacity(selection.clips.len());
    for clip in &selection.clips {
        clips.push(normalizer.normalize(clip, &scene_dir)?);
    }

    Ok(PreparedScene {
        raw_text: scene.text.clone(),
        stripped_text: strip_tags(&scene.text),
        narration: scene.narration.clone(),
        narration_secs,
        clips,
    })
}

/// Maps one scene's annotation tags to events, mixing a resolved sound
/// effect into the narration. Locate failures are logged and skipped; the
/// scene proceeds without the event.
#[allow(clippy::too_many_arguments)]
fn map_scene_events(
    spawner: &SidecarSpawner,
    prober: &CrateFfprobeProber,
    scene: &PreparedScene,
    segment: &AlignedSegment,
    overlays: &dyn OverlayResolver,
    sounds: &dyn SoundEffectResolver,
    narration: &std::path::Path,
    job_dir: &std::path::Path,
) -> CoreResult<(Vec<AnnotationEvent>, PathBuf)> {
    let mut events = Vec::new();
    let mut narration = narration.to_path_buf();
    let mut prior: Option<PriorEvent> = None;

    if let Some(tag) = find_tag(&scene.raw_text, AnnotationKind::SoundEffect)? {
        match sounds.resolve_sound(&tag.keyword) {
            None => log::warn!("no sound effect asset for keyword '{}'", tag.keyword),
            Some(asset) => match map_event(&tag, segment, asset.clone(), None) {
                Ok(event) => {
                    let effect_secs = audio::duration(prober, &asset)?;
                    narration = audio::mix_sound_effect(
                        spawner,
                        &narration,
                        &asset,
                        event.begin_time,
                        job_dir,
                    )?;
                    prior = Some(PriorEvent {
                        text_offset: event.text_offset,
                        duration_secs: effect_secs,
                    });
                    events.push(event);
                }
                Err(CoreError::EventLocateFailure { content }) => {
                    log::warn!("skipping sound-effect event, content {content:?} not locatable");
                }
                Err(err) => return Err(err),
            },
        }
    }

    if let Some(tag) = find_tag(&scene.raw_text, AnnotationKind::Overlay)? {
        match overlays.resolve_overlay(&tag.keyword) {
            None => log::warn!("no overlay asset for keyword '{}'", tag.keyword),
            Some(asset) => match map_event(&tag, segment, asset, prior) {
                Ok(event) => events.push(event),
                Err(CoreError::EventLocateFailure { content }) => {
                    log::warn!("skipping overlay event, content {content:?} not locatable");
                }
                Err(err) => return Err(err),
            },
        }
    }

    Ok((events, narration))
}

fn write_subtitles(artifact: &std::path::Path, segments: &[AlignedSegment]) -> Option<PathBuf> {
    let srt_path = artifact.with_extension("srt");
    match fs::write(&srt_path, alignment::to_srt(segments)) {
        Ok(()) => Some(srt_path),
        Err(err) => {
            log::warn!("failed to write subtitles: {err}");
            None
        }
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
