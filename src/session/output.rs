// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Line framing for remote output
//!
//! Pipe reads split the stream at arbitrary byte offsets. The decoder holds
//! bytes back until a newline arrives, so a line (and any multibyte
//! character in it) is never cut in two.

/// Bytes held back waiting for a newline before they are released anyway.
pub const MAX_PENDING_LINE: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct OutputDecoder {
    buffer: Vec<u8>,
}

impl OutputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes read from the stream. Returns the text of every complete
    /// line received so far, newlines included.
    pub fn feed(&mut self, data: &[u8]) -> Option<String> {
        self.buffer.extend_from_slice(data);
        let end = match self.buffer.iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None if self.buffer.len() >= MAX_PENDING_LINE => complete_utf8_len(&self.buffer),
            None => return None,
        };
        self.take(end)
    }

    /// Release a partial line, such as a shell prompt. A character whose
    /// bytes have not all arrived stays buffered.
    pub fn flush(&mut self) -> Option<String> {
        let end = complete_utf8_len(&self.buffer);
        self.take(end)
    }

    /// Release everything at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        let end = self.buffer.len();
        self.take(end)
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn take(&mut self, end: usize) -> Option<String> {
        if end == 0 {
            return None;
        }
        let bytes: Vec<u8> = self.buffer.drain(..end).collect();
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Length of `bytes` without a trailing, incomplete UTF-8 sequence.
fn complete_utf8_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let needed = match byte {
            0xF0..=0xFF => 4,
            0xE0..=0xEF => 3,
            0xC0..=0xDF => 2,
            _ => 1,
        };
        return if needed > back { len - back } else { len };
    }
    len
}
