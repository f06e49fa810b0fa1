use crate::error::{Channel, ConfigError};

/// Encoder configuration
///
/// Chunk capacities are per channel and fixed for the life of an encoder.
/// They trade allocation count against slack: text-heavy documents fill the
/// character channel far faster than the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Bytes per structure fragment
    pub structure_chunk: usize,
    /// Strings per structure-strings fragment
    pub strings_chunk: usize,
    /// Bytes per content-characters fragment
    pub chars_chunk: usize,
    /// Objects per content-objects fragment
    pub objects_chunk: usize,
    /// Runs at least this long are copied out of line when they do not fit
    pub copy_threshold: usize,
    /// Route names through a `NameInterner`
    pub intern_names: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            structure_chunk: 1024,
            strings_chunk: 512,
            chars_chunk: 4096,
            objects_chunk: 64,
            copy_threshold: 512,
            intern_names: false,
        }
    }
}

impl EncoderConfig {
    /// Set all four chunk capacities at once
    pub fn with_chunks(mut self, structure: usize, strings: usize, chars: usize, objects: usize) -> Self {
        self.structure_chunk = structure;
        self.strings_chunk = strings;
        self.chars_chunk = chars;
        self.objects_chunk = objects;
        self
    }

    pub fn with_copy_threshold(mut self, threshold: usize) -> Self {
        self.copy_threshold = threshold;
        self
    }

    pub fn with_interning(mut self) -> Self {
        self.intern_names = true;
        self
    }

    /// Check the capacities against the text routing rules
    ///
    /// A run shorter than the copy threshold that does not fit is moved to a
    /// fresh character fragment, so a fragment must be able to hold it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (capacity, channel) in [
            (self.structure_chunk, Channel::Structure),
            (self.strings_chunk, Channel::Strings),
            (self.chars_chunk, Channel::Characters),
            (self.objects_chunk, Channel::Objects),
        ] {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity(channel));
            }
        }
        if self.chars_chunk < self.copy_threshold {
            return Err(ConfigError::CharChunkTooSmall {
                capacity: self.chars_chunk,
                threshold: self.copy_threshold,
            });
        }
        Ok(())
    }
}
