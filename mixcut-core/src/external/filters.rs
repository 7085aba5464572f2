//! Pure ffmpeg filter-string builders.
//!
//! Everything here is plain string construction so the exact filter graphs
//! the pipeline hands to ffmpeg can be unit tested without running it.
//! The compositing itself stays inside ffmpeg.

use crate::util::format_secs;

/// Aspect-correct scale to fit inside the target, then pad to exact size.
/// Used for plain resolution normalization of accepted video clips.
pub fn scale_pad_filter(width: u32, height: u32) -> String {
    format!(
        "scale='if(gt(a,{w}/{h}),{w},-1)':'if(gt(a,{w}/{h}),-1,{h})',\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    )
}

/// Aspect-correct scale to cover the target, then center-crop to exact size.
/// Used for still-image expansion and trimmed clips. `source_wider` picks
/// the scaling axis from the source aspect relative to the target.
pub fn scale_crop_filter(width: u32, height: u32, source_wider: bool) -> String {
    let scale = if source_wider {
        format!("scale=-1:{height}:force_original_aspect_ratio=1")
    } else {
        format!("scale={width}:-1:force_original_aspect_ratio=1")
    };
    format!("{scale},crop={width}:{height}:(ow-iw)/2:(oh-ih)/2")
}

/// Builds the crossfade graph for `durations.len()` video inputs.
///
/// Each xfade consumes `overlap` seconds from the running offset, so the
/// n-th fade starts at `sum(d_0..=d_n-1) - n*overlap`. The composed stream
/// is labelled `[video]`.
///
/// Panics in debug builds when fewer than two inputs are given; callers
/// fall back to plain concatenation for a single clip.
pub fn xfade_graph(durations: &[f64], kind: &str, overlap: f64) -> String {
    debug_assert!(durations.len() >= 2);

    let mut graph = String::new();
    let mut offset = 0.0;
    let last = durations.len() - 1;

    for i in 1..durations.len() {
        offset += durations[i - 1] - overlap;
        let src = if i == 1 {
            "[0:v]".to_string()
        } else {
            format!("[f{}]", i - 1)
        };
        let dst = if i == last {
            "[video]".to_string()
        } else {
            format!("[f{i}]")
        };
        graph.push_str(&format!(
            "{src}[{i}:v]xfade=transition={kind}:duration={dur}:offset={off}{dst}",
            dur = format_secs(overlap),
            off = format_secs(offset),
        ));
        if i != last {
            graph.push(';');
        }
    }
    graph
}

/// Loops the music bed, applies linear gain, and mixes it under the
/// narration; `duration=first` pins the output length to the narration.
pub fn background_music_filter(volume: f64) -> String {
    format!(
        "[1:a]aloop=loop=-1:size=2147483647[bgm];\
         [bgm]volume={volume}[bgm_vol];\
         [0:a][bgm_vol]amix=inputs=2:duration=first:dropout_transition=3[aout]"
    )
}

/// Composites the overlay image over the clip inside a time window.
/// The image is faded to `opacity`, capped to the frame width minus the
/// edge padding, and centered.
pub fn overlay_filter(
    rel_start: f64,
    rel_end: f64,
    opacity: f64,
    padding_px: u32,
    target_width: u32,
) -> String {
    let max_width = target_width.saturating_sub(2 * padding_px).max(2);
    format!(
        "[1:v]format=rgba,colorchannelmixer=aa={opacity},scale='min(iw,{max_width})':-2[ovl];\
         [0:v][ovl]overlay=(W-w)/2:(H-h)/2:enable='between(t,{start},{end})'[vout]",
        start = format_secs(rel_start),
        end = format_secs(rel_end),
    )
}

/// Delays the effect to its text-anchored offset, attenuates it, and mixes
/// it over the narration; `duration=longest` lets an effect tail extend
/// playback past the spoken end.
pub fn sound_effect_filter(offset_secs: f64, gain_db: f64) -> String {
    let delay_ms = (offset_secs.max(0.0) * 1000.0).round() as u64;
    format!(
        "[1:a]adelay={delay_ms}:all=1,volume={gain_db}dB[fx];\
         [0:a][fx]amix=inputs=2:duration=longest:dropout_transition=0:normalize=0[aout]"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_pad_targets_exact_size() {
        let filter = scale_pad_filter(1920, 1080);
        assert!(filter.contains("pad=1920:1080"));
        assert!(filter.contains("gt(a,1920/1080)"));
    }

    #[test]
    fn scale_crop_picks_axis_from_source_aspect() {
        let wider = scale_crop_filter(1080, 1920, true);
        assert!(wider.starts_with("scale=-1:1920"));
        let taller = scale_crop_filter(1080, 1920, false);
        assert!(taller.starts_with("scale=1080:-1"));
        assert!(taller.contains("crop=1080:1920"));
    }

    #[test]
    fn xfade_offsets_are_cumulative_minus_overlap() {
        let graph = xfade_graph(&[6.0, 8.0, 5.0], "fade", 1.0);
        // first fade starts at 6 - 1 = 5, second at 5 + 8 - 1 = 12
        assert!(graph.contains("offset=5.000"));
        assert!(graph.contains("offset=12.000"));
        assert!(graph.contains("[0:v][1:v]xfade=transition=fade:duration=1.000"));
        assert!(graph.ends_with("[video]"));
        assert_eq!(graph.matches("xfade").count(), 2);
    }

    #[test]
    fn xfade_two_inputs_composes_directly_to_video() {
        let graph = xfade_graph(&[4.0, 4.0], "wipeleft", 0.5);
        assert_eq!(
            graph,
            "[0:v][1:v]xfade=transition=wipeleft:duration=0.500:offset=3.500[video]"
        );
    }

    #[test]
    fn background_music_pins_duration_to_narration() {
        let filter = background_music_filter(0.3);
        assert!(filter.contains("volume=0.3"));
        assert!(filter.contains("duration=first"));
        assert!(filter.contains("aloop=loop=-1"));
    }

    #[test]
    fn overlay_window_is_encoded_in_enable() {
        let filter = overlay_filter(1.5, 4.25, 0.9, 100, 1920);
        assert!(filter.contains("between(t,1.500,4.250)"));
        assert!(filter.contains("aa=0.9"));
        assert!(filter.contains("min(iw,1720)"));
    }

    #[test]
    fn sound_effect_delay_is_milliseconds() {
        let filter = sound_effect_filter(2.35, -9.0);
        assert!(filter.contains("adelay=2350:all=1"));
        assert!(filter.contains("volume=-9dB"));
        assert!(filter.contains("duration=longest"));
    }
}
