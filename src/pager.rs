/*
 * @file pager.rs
 * @brief Word-packing pager for the 16x2 LCD face
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Display pager.
//!
//! Turns an arbitrary reply into a [`Script`] of two-line [`Page`]s and plays
//! it on a [`Face`] at a fixed cadence.

use std::time::Duration;

use anyhow::Result;

use crate::hardware::Face;

/// Characters per LCD row.
pub const LCD_COLUMNS: usize = 16;

/// Rows per LCD screen.
pub const LCD_ROWS: usize = 2;

/// Default time each page stays on screen.
pub const DEFAULT_PAGE_PAUSE: Duration = Duration::from_millis(2500);

/// What to do with a word longer than the page width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep the word whole on its own line; the screen cuts it when drawn.
    #[default]
    Truncate,
    /// Split the word into width-sized chunks while packing.
    HardWrap,
}

/// One screenful: a top and a bottom line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub top: String,
    pub bottom: String,
}

impl Page {
    /// Builds a page from its two rows, uncut.
    pub fn new(top: impl Into<String>, bottom: impl Into<String>) -> Self {
        Self {
            top: top.into(),
            bottom: bottom.into(),
        }
    }

    /// Both lines cut to `width` characters, as the screen will show them.
    pub fn fitted(&self, width: usize) -> Page {
        Page {
            top: fit(&self.top, width),
            bottom: fit(&self.bottom, width),
        }
    }
}

/// Ordered, immutable pages for one answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    pages: Vec<Page>,
}

impl Script {
    /// Pages in display order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages; never zero for a paginated script.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl IntoIterator for Script {
    type Item = Page;
    type IntoIter = std::vec::IntoIter<Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.into_iter()
    }
}

/// Fixed-geometry pager with a fixed page cadence.
///
/// Pages are always [`LCD_ROWS`] lines tall.
#[derive(Clone, Copy, Debug)]
pub struct Pager {
    pub width: usize,
    pub pause: Duration,
    pub overflow: OverflowPolicy,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            width: LCD_COLUMNS,
            pause: DEFAULT_PAGE_PAUSE,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl Pager {
    /// Splits `text` into pages.
    ///
    /// Empty or whitespace-only text yields a single empty page.
    pub fn paginate(&self, text: &str) -> Script {
        let lines = pack_lines(text, self.width, self.overflow);
        if lines.is_empty() {
            return Script {
                pages: vec![Page::default()],
            };
        }
        Script {
            pages: group_pages(lines),
        }
    }

    /// Shows every page in order, pausing after each one.
    ///
    /// No page is skipped or merged.
    pub async fn play(&self, script: Script, face: &mut dyn Face) -> Result<()> {
        for page in script {
            let page = page.fitted(self.width);
            face.show(&page.top, &page.bottom)?;
            tokio::time::sleep(self.pause).await;
        }
        Ok(())
    }
}

/// Greedily packs whitespace-separated words into lines of at most `width`.
///
/// Under [`OverflowPolicy::Truncate`] a word longer than `width` still gets
/// its own line, so that line can exceed `width`.
pub fn pack_lines(text: &str, width: usize, overflow: OverflowPolicy) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        for piece in word_pieces(word, width, overflow) {
            let piece_len = piece.chars().count();
            let gap = usize::from(current_len > 0);
            if current_len + gap + piece_len <= width {
                if gap == 1 {
                    current.push(' ');
                }
                current.push_str(&piece);
                current_len += gap + piece_len;
            } else {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                }
                current = piece;
                current_len = piece_len;
            }
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Splits one word for packing.
///
/// # Parameters
/// * `word` - A single whitespace-free word.
/// * `width` - Screen width in characters.
/// * `overflow` - What to do when `word` is wider than `width`.
///
/// # Returns
/// The whole word under [`OverflowPolicy::Truncate`], or `width`-sized
/// chunks under [`OverflowPolicy::HardWrap`].
fn word_pieces(word: &str, width: usize, overflow: OverflowPolicy) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    if overflow == OverflowPolicy::Truncate || chars.len() <= width {
        return vec![word.to_string()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Pairs packed lines into two-row pages; an odd last line gets an empty
/// bottom row.
fn group_pages(lines: Vec<String>) -> Vec<Page> {
    let mut pages = Vec::with_capacity(lines.len().div_ceil(LCD_ROWS));
    let mut lines = lines.into_iter();
    while let Some(top) = lines.next() {
        let bottom = lines.next().unwrap_or_default();
        pages.push(Page { top, bottom });
    }
    pages
}

/// Cuts `text` to at most `width` characters.
pub fn fit(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::testing::RecordingFace;

    const FOX: &str = "The quick brown fox jumps over the lazy dog";

    fn pager() -> Pager {
        Pager {
            pause: Duration::ZERO,
            ..Pager::default()
        }
    }

    #[test]
    fn packs_the_fox_into_three_lines_two_pages() {
        let lines = pack_lines(FOX, 16, OverflowPolicy::Truncate);
        assert_eq!(lines, vec!["The quick brown", "fox jumps over", "the lazy dog"]);

        let script = pager().paginate(FOX);
        assert_eq!(script.len(), 2);
        assert_eq!(script.pages()[0], Page::new("The quick brown", "fox jumps over"));
        assert_eq!(script.pages()[1], Page::new("the lazy dog", ""));
    }

    #[test]
    fn empty_text_is_one_empty_page() {
        let script = pager().paginate("");
        assert_eq!(script.pages(), &[Page::default()]);
        assert_eq!(pager().paginate(" \n\t ").pages(), &[Page::default()]);
    }

    #[test]
    fn word_without_spaces_is_one_line_cut_on_render() {
        let word = "Supercalifragilisticexpialidocious";
        let script = pager().paginate(word);
        assert_eq!(script.pages(), &[Page::new(word, "")]);
        assert_eq!(script.pages()[0].fitted(16).top, "Supercalifragili");
    }

    #[test]
    fn hard_wrap_splits_oversized_words() {
        let lines = pack_lines("a Supercalifragilisticexpialidocious b", 16, OverflowPolicy::HardWrap);
        assert_eq!(lines, vec!["a", "Supercalifragili", "sticexpialidocio", "us b"]);
        assert!(lines.iter().all(|line| line.chars().count() <= 16));
    }

    #[test]
    fn lines_never_exceed_width_and_keep_every_word() {
        let samples = [
            FOX,
            "Snow leopards live in the mountains of Central and South Asia, purr.",
            "a bb ccc dddd eeeee ffffff ggggggg hhhhhhhh iiiiiiiii jjjjjjjjjj",
            "  spaced   out\ttext\nwith  newlines  ",
            "sixteen-chars-ok sixteen-chars-ok x",
        ];
        for width in [8, 12, 16, 20] {
            for text in samples {
                let lines = pack_lines(text, width, OverflowPolicy::Truncate);
                let words: Vec<&str> = text.split_whitespace().collect();
                let repacked: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
                assert_eq!(repacked, words, "width {width}: {text:?}");
                for line in &lines {
                    let single_word = !line.contains(' ');
                    assert!(line.chars().count() <= width || single_word, "{line:?}");
                }
            }
        }
    }

    #[test]
    fn page_count_is_ceiling_of_lines_over_rows() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        for width in 3..=20 {
            let pager = Pager { width, ..pager() };
            let lines = pack_lines(text, width, OverflowPolicy::Truncate).len();
            assert_eq!(pager.paginate(text).len(), lines.div_ceil(LCD_ROWS));
        }
    }

    #[test]
    fn counts_characters_not_bytes() {
        let lines = pack_lines("café crème brûlée", 10, OverflowPolicy::Truncate);
        assert_eq!(lines, vec!["café crème", "brûlée"]);
    }

    #[tokio::test]
    async fn play_shows_every_page_in_order() {
        let mut face = RecordingFace::default();
        let pager = pager();
        pager.play(pager.paginate(FOX), &mut face).await.unwrap();
        assert_eq!(
            face.screens(),
            vec![
                Page::new("The quick brown", "fox jumps over"),
                Page::new("the lazy dog", ""),
            ]
        );
    }
}
