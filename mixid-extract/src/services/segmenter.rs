//! Audio segmenter
//!
//! Decodes the downloaded mix with symphonia (MP3, FLAC, AAC, WAV, OGG, ...)
//! and writes consecutive fixed-duration slices as 16-bit mono WAV files.
//!
//! Decoding is streamed: at most one chunk of samples is held at a time, so a
//! two-hour mix does not have to fit in memory as PCM.

use crate::models::Segment;
use crate::types::{ExtractionError, Segmenter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Splits audio files with symphonia + hound
#[derive(Debug, Clone, Default)]
pub struct AudioSegmenter;

impl AudioSegmenter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Segmenter for AudioSegmenter {
    async fn split(
        &self,
        media: &Path,
        chunk_duration: u32,
        scratch_dir: &Path,
    ) -> Result<Vec<Segment>, ExtractionError> {
        if chunk_duration == 0 {
            return Err(ExtractionError::InvalidInput(
                "chunk_duration must be positive".to_string(),
            ));
        }

        let media = media.to_path_buf();
        let scratch_dir = scratch_dir.to_path_buf();

        // Decoding is CPU-bound
        tokio::task::spawn_blocking(move || split_file(&media, chunk_duration, &scratch_dir))
            .await
            .map_err(|e| ExtractionError::Decode(format!("segmenter task failed: {}", e)))?
    }
}

/// Chunk file currently being written
struct OpenChunk {
    index: u32,
    path: PathBuf,
    writer: hound::WavWriter<BufWriter<File>>,
    frames: u64,
}

/// Streaming chunk writer; one WAV per `frames_per_chunk` mono frames
struct ChunkWriter<'a> {
    scratch_dir: &'a Path,
    chunk_duration: u32,
    sample_rate: u32,
    frames_per_chunk: u64,
    current: Option<OpenChunk>,
    finished: Vec<Segment>,
}

impl<'a> ChunkWriter<'a> {
    fn new(scratch_dir: &'a Path, chunk_duration: u32, sample_rate: u32) -> Self {
        Self {
            scratch_dir,
            chunk_duration,
            sample_rate,
            frames_per_chunk: u64::from(sample_rate) * u64::from(chunk_duration),
            current: None,
            finished: Vec::new(),
        }
    }

    fn push(&mut self, sample: f32) -> Result<(), ExtractionError> {
        if self.current.is_none() {
            self.open_next()?;
        }

        let full = match self.current.as_mut() {
            Some(chunk) => {
                let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
                chunk
                    .writer
                    .write_sample(pcm)
                    .map_err(|e| wav_error(&chunk.path, e))?;
                chunk.frames += 1;
                chunk.frames >= self.frames_per_chunk
            }
            None => false,
        };

        if full {
            self.close_current()?;
        }
        Ok(())
    }

    fn open_next(&mut self) -> Result<(), ExtractionError> {
        let index = self.finished.len() as u32;
        let path = self.scratch_dir.join(format!("segment_{:05}.wav", index));
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(&path, spec).map_err(|e| wav_error(&path, e))?;

        self.current = Some(OpenChunk {
            index,
            path,
            writer,
            frames: 0,
        });
        Ok(())
    }

    fn close_current(&mut self) -> Result<(), ExtractionError> {
        let Some(chunk) = self.current.take() else {
            return Ok(());
        };

        chunk
            .writer
            .finalize()
            .map_err(|e| wav_error(&chunk.path, e))?;

        let start = f64::from(chunk.index) * f64::from(self.chunk_duration);
        let end = start + chunk.frames as f64 / f64::from(self.sample_rate);
        self.finished
            .push(Segment::new(chunk.index, start, end, chunk.path));
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Segment>, ExtractionError> {
        self.close_current()?;
        Ok(self.finished)
    }
}

fn wav_error(path: &Path, e: hound::Error) -> ExtractionError {
    ExtractionError::Decode(format!("writing {}: {}", path.display(), e))
}

/// Decode `media` and write its chunks into `scratch_dir`
pub fn split_file(
    media: &Path,
    chunk_duration: u32,
    scratch_dir: &Path,
) -> Result<Vec<Segment>, ExtractionError> {
    tracing::debug!(path = %media.display(), chunk_duration, "Splitting audio file");

    let file = File::open(media)
        .map_err(|e| ExtractionError::Decode(format!("open {}: {}", media.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = media.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| ExtractionError::Decode(format!("probe {}: {}", media.display(), e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ExtractionError::Decode("no audio track found".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ExtractionError::Decode(format!("unsupported codec: {}", e)))?;

    let mut chunks: Option<ChunkWriter> = None;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(e) => {
                end_of_stream(media, e)?;
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt frames are common in MP3 rips; skip them
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                tracing::debug!(error = %e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(ExtractionError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);

        let too_small = sample_buf
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() * channels);
        if too_small {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        let writer =
            chunks.get_or_insert_with(|| ChunkWriter::new(scratch_dir, chunk_duration, spec.rate));
        for frame in buf.samples().chunks(channels) {
            let mono = frame.iter().sum::<f32>() / channels as f32;
            writer.push(mono)?;
        }
    }

    if skipped_packets > 0 {
        tracing::warn!(
            path = %media.display(),
            skipped_packets,
            "Some packets could not be decoded"
        );
    }

    let segments = match chunks {
        Some(writer) => writer.finish()?,
        None => Vec::new(),
    };

    tracing::info!(
        path = %media.display(),
        segments = segments.len(),
        "Audio split complete"
    );
    Ok(segments)
}

/// Sort a packet read error into a normal end of stream or a decode failure
///
/// A reset means the stream parameters changed mid-file (chained streams);
/// what was decoded so far is kept and the rest is dropped with a warning.
fn end_of_stream(media: &Path, err: SymphoniaError) -> Result<(), ExtractionError> {
    match err {
        SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(()),
        SymphoniaError::ResetRequired => {
            tracing::warn!(
                path = %media.display(),
                "Stream parameters changed mid-file; remaining audio ignored"
            );
            Ok(())
        }
        e => Err(ExtractionError::Decode(format!("reading packet: {}", e))),
    }
}
