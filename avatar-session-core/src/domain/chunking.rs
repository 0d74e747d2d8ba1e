/// Server-side cap on a single audio chunk is 30KB; 10KB keeps well below it
pub const DEFAULT_AUDIO_CHUNK_SIZE: usize = 10_000;

/// SSML pause sent between the two demo sentences
pub const DEFAULT_BREAK: &str = r#"<break time="3s" />"#;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Size should be a positive number")]
    ZeroSize,
}

/// Split bytes into consecutive slices of at most `size`
pub fn split_into_chunks(data: &[u8], size: usize) -> Result<Vec<&[u8]>, ChunkError> {
    if size == 0 {
        return Err(ChunkError::ZeroSize);
    }
    Ok(data.chunks(size).collect())
}

/// Numbers audio slices across network reads.
///
/// Every read is split into slices of at most `size` bytes; indices keep
/// counting across reads. The stream is closed by an empty chunk at
/// [`AudioChunker::finish`].
#[derive(Debug, Clone)]
pub struct AudioChunker {
    size: usize,
    next_index: usize,
}

impl AudioChunker {
    pub fn new(size: usize) -> Result<Self, ChunkError> {
        if size == 0 {
            return Err(ChunkError::ZeroSize);
        }
        Ok(Self {
            size,
            next_index: 0,
        })
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Indexed slices of one network read
    pub fn push<'a>(&mut self, data: &'a [u8]) -> Vec<(usize, &'a [u8])> {
        let mut slices = Vec::with_capacity(data.len().div_ceil(self.size));
        for chunk in data.chunks(self.size) {
            slices.push((self.next_index, chunk));
            self.next_index += 1;
        }
        slices
    }

    /// Index of the empty end-of-stream chunk; total chunks sent is one more
    pub fn finish(self) -> usize {
        self.next_index
    }
}

/// Word chunks for the text streaming protocol.
///
/// SSML tags must travel in one chunk, so `break_tag` is never split. The
/// final empty chunk marks the end of the text stream.
pub fn text_script_chunks(first: &str, break_tag: Option<&str>, second: Option<&str>) -> Vec<String> {
    let mut chunks: Vec<String> = first.split(' ').map(str::to_string).collect();

    if let Some(tag) = break_tag {
        chunks.push(tag.to_string());
    }
    if let Some(text) = second {
        chunks.extend(text.split(' ').map(str::to_string));
    }

    chunks.push(String::new());
    chunks
}
