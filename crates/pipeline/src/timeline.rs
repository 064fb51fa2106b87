//! Order-preserving assembly of per-segment artifacts
//!
//! Background tasks finish in arbitrary order; assembly restores script
//! order deterministically because callers hand clips over by iterating the
//! ordered pipeline list, never by arrival order.

use crate::error::PipelineError;
use std::io::Cursor;
use storycast_core::Artifact;

/// Concatenate per-segment WAV clips into one combined WAV
///
/// The first decodable clip fixes the output sample rate and channel count;
/// a later clip with a different format is skipped with a warning rather
/// than failing the whole timeline. Samples are written as 16-bit PCM,
/// converting float clips on the way through.
pub fn combine_audio<'a>(
    clips: impl IntoIterator<Item = &'a Artifact>,
) -> Result<Option<Vec<u8>>, PipelineError> {
    let mut out_spec: Option<hound::WavSpec> = None;
    let mut samples: Vec<i16> = Vec::new();

    for (position, clip) in clips.into_iter().enumerate() {
        let reader = match hound::WavReader::new(Cursor::new(&clip.bytes)) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(position, error = %e, "skipping undecodable audio clip");
                continue;
            }
        };
        let spec = reader.spec();
        match out_spec {
            None => {
                out_spec = Some(spec);
            }
            Some(expected)
                if expected.sample_rate != spec.sample_rate
                    || expected.channels != spec.channels =>
            {
                tracing::warn!(
                    position,
                    sample_rate = spec.sample_rate,
                    channels = spec.channels,
                    "skipping audio clip with mismatched format"
                );
                continue;
            }
            Some(_) => {}
        }
        append_samples(reader, &mut samples)?;
    }

    let Some(spec) = out_spec else {
        return Ok(None);
    };

    let spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(Some(cursor.into_inner()))
}

fn append_samples<R: std::io::Read>(
    mut reader: hound::WavReader<R>,
    samples: &mut Vec<i16>,
) -> Result<(), PipelineError> {
    match reader.spec().sample_format {
        hound::SampleFormat::Int => {
            for sample in reader.samples::<i16>() {
                samples.push(sample?);
            }
        }
        hound::SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                let sample = sample?;
                samples.push((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16);
            }
        }
    }
    Ok(())
}

/// Concatenate rendered video clips in the order given
pub fn combine_video<'a>(clips: impl IntoIterator<Item = &'a Artifact>) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    for clip in clips {
        out.extend_from_slice(&clip.bytes);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tiny_wav;
    use storycast_core::ArtifactKind;

    fn clip(sample: i16) -> Artifact {
        Artifact::new(ArtifactKind::Audio, tiny_wav(sample))
    }

    fn decode(bytes: &[u8]) -> Vec<i16> {
        hound::WavReader::new(Cursor::new(bytes))
            .unwrap()
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_combine_audio_preserves_order() {
        let clips = [clip(10), clip(20), clip(30)];
        let combined = combine_audio(clips.iter()).unwrap().unwrap();
        assert_eq!(decode(&combined), vec![10, 20, 30]);
    }

    #[test]
    fn test_combine_audio_skips_undecodable_clip() {
        let garbage = Artifact::new(ArtifactKind::Audio, vec![0xde, 0xad]);
        let clips = [clip(1), garbage, clip(3)];
        let combined = combine_audio(clips.iter()).unwrap().unwrap();
        assert_eq!(decode(&combined), vec![1, 3]);
    }

    #[test]
    fn test_combine_audio_empty_input() {
        assert!(combine_audio(std::iter::empty::<&Artifact>())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_combine_video_order_and_empty() {
        let a = Artifact::new(ArtifactKind::Render, b"aaa".to_vec());
        let b = Artifact::new(ArtifactKind::Render, b"bbb".to_vec());
        assert_eq!(combine_video([&a, &b]), Some(b"aaabbb".to_vec()));
        assert_eq!(combine_video(std::iter::empty::<&Artifact>()), None);
    }
}
