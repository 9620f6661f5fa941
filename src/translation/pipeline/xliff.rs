//! XLIFF 段落流适配器
//!
//! 用 XML 拉取解析器逐个事件读取导出的 XLIFF 2.x 文档，
//! 每遇到一个 `</segment>` 就产出一个段落，不在内存中构建整棵文档树。
//!
//! ## 提取规则
//!
//! - 段落标识取自外层 `<file id>`、`<unit id>` 与 `<segment id>`，三者缺一即为结构错误
//! - `<source>` 的内部标记与文本保持文档中的原样，CDATA 内容转义后并入文本
//! - 单元内 `<gls:glossEntry>` 的 `<gls:term>` / `<gls:translation>` 作为术语提示
//! - 纯文本为空白的段落直接跳过
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use multi_translator::translation::pipeline::XliffSegments;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! for segment in XliffSegments::from_path("project.xlf")? {
//!     let segment = segment?;
//!     println!("{}: {}", segment.id, segment.source);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesCData, BytesStart, BytesText, Event};
use quick_xml::Reader;

use crate::translation::core::types::{Segment, SegmentId, Term};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::markup::{escape_text, strip_markup};

/// 按文档顺序产出段落的迭代器
///
/// 结构错误只报告一次，之后迭代结束。
pub struct XliffSegments<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: ReaderState,
    finished: bool,
    failed: bool,
}

impl XliffSegments<BufReader<File>> {
    /// 打开导出文档
    pub fn from_path<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TranslationError::ParseError(format!("无法打开文档 {}: {}", path.display(), e))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> XliffSegments<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            state: ReaderState::default(),
            finished: false,
            failed: false,
        }
    }

    fn fail(&mut self, error: TranslationError) -> Option<TranslationResult<Segment>> {
        self.failed = true;
        Some(Err(error))
    }
}

impl<R: BufRead> Iterator for XliffSegments<R> {
    type Item = TranslationResult<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }
            if let Some(error) = self.state.error.take() {
                return self.fail(error);
            }
            if let Some(segment) = self.state.ready.pop_front() {
                return Some(Ok(segment));
            }
            if self.finished {
                return None;
            }

            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Eof) => {
                    self.state.eof();
                    self.finished = true;
                }
                Ok(event) => self.state.consume(event),
                Err(e) => {
                    let position = self.reader.buffer_position();
                    return self.fail(TranslationError::ParseError(format!(
                        "XML 解析失败 (位置 {}): {}",
                        position, e
                    )));
                }
            }
        }
    }
}

#[derive(Default)]
struct OpenSegment {
    id: String,
    source: Option<String>,
    in_source: bool,
}

#[derive(Default)]
struct GlossEntry {
    term: String,
    translation: String,
    field: Option<GlossField>,
}

#[derive(Clone, Copy)]
enum GlossField {
    Term,
    Translation,
}

#[derive(Default)]
struct ReaderState {
    file: Option<String>,
    unit: Option<String>,
    terms: Vec<Term>,
    segment: Option<OpenSegment>,
    gloss: Option<GlossEntry>,
    ready: VecDeque<Segment>,
    error: Option<TranslationError>,
}

fn utf8(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| format!("文档不是有效的 UTF-8: {}", e))
}

fn attribute(tag: &BytesStart, name: &[u8]) -> Result<Option<String>, String> {
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| format!("属性无效: {}", e))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| format!("属性值无效: {}", e))?;
            return Ok(Some(value.into_owned()).filter(|v| !v.trim().is_empty()));
        }
    }
    Ok(None)
}

impl ReaderState {
    fn consume(&mut self, event: Event<'_>) {
        if self.error.is_some() {
            return;
        }

        let result = match event {
            Event::Start(tag) => self.start_tag(&tag, false),
            Event::Empty(tag) => self.start_tag(&tag, true),
            Event::End(tag) => {
                let name = tag.name();
                self.end_tag(name.as_ref())
            }
            Event::Text(text) => self.text(&text),
            Event::CData(data) => self.cdata(&data),
            _ => Ok(()),
        };

        if let Err(message) = result {
            self.structural(message);
        }
    }

    fn structural(&mut self, message: String) {
        self.error = Some(TranslationError::ParseError(message));
    }

    fn start_tag(&mut self, tag: &BytesStart, empty: bool) -> Result<(), String> {
        if let Some(segment) = self.segment.as_mut() {
            if segment.in_source {
                if let Some(source) = segment.source.as_mut() {
                    source.push('<');
                    source.push_str(utf8(tag)?);
                    source.push_str(if empty { "/>" } else { ">" });
                }
                return Ok(());
            }
        }

        let name = tag.name();
        match name.as_ref() {
            b"file" if !empty => match attribute(tag, b"id")? {
                Some(id) => self.file = Some(id),
                None => return Err("<file> 缺少 id 属性".to_string()),
            },
            b"unit" if !empty => {
                if self.file.is_none() {
                    return Err("<unit> 不在 <file> 内".to_string());
                }
                match attribute(tag, b"id")? {
                    Some(id) => {
                        self.unit = Some(id);
                        self.terms.clear();
                    }
                    None => return Err("<unit> 缺少 id 属性".to_string()),
                }
            }
            b"segment" => {
                let Some(unit) = self.unit.clone() else {
                    return Err("<segment> 不在 <unit> 内".to_string());
                };
                let Some(id) = attribute(tag, b"id")? else {
                    return Err(format!("单元 {} 中的 <segment> 缺少 id 属性", unit));
                };
                if empty {
                    return Err(format!("段落 {} 缺少 <source>", id));
                }
                self.segment = Some(OpenSegment {
                    id,
                    ..Default::default()
                });
            }
            b"source" => {
                if let Some(segment) = self.segment.as_mut() {
                    segment.source = Some(String::new());
                    segment.in_source = !empty;
                }
            }
            b"gls:glossEntry" if self.unit.is_some() && !empty => {
                self.gloss = Some(GlossEntry::default());
            }
            b"gls:term" if !empty => {
                if let Some(gloss) = self.gloss.as_mut() {
                    gloss.field = Some(GlossField::Term);
                }
            }
            b"gls:translation" if !empty => {
                if let Some(gloss) = self.gloss.as_mut() {
                    gloss.field = Some(GlossField::Translation);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end_tag(&mut self, name: &[u8]) -> Result<(), String> {
        if let Some(segment) = self.segment.as_mut() {
            if segment.in_source {
                if name == b"source" {
                    segment.in_source = false;
                } else if let Some(source) = segment.source.as_mut() {
                    source.push_str("</");
                    source.push_str(utf8(name)?);
                    source.push('>');
                }
                return Ok(());
            }
        }

        match name {
            b"segment" => self.close_segment()?,
            b"unit" => {
                if let Some(segment) = &self.segment {
                    return Err(format!("段落 {} 未闭合", segment.id));
                }
                self.unit = None;
                self.terms.clear();
            }
            b"file" => {
                if let Some(unit) = &self.unit {
                    return Err(format!("单元 {} 未闭合", unit));
                }
                self.file = None;
            }
            b"gls:term" | b"gls:translation" => {
                if let Some(gloss) = self.gloss.as_mut() {
                    gloss.field = None;
                }
            }
            b"gls:glossEntry" => {
                if let Some(gloss) = self.gloss.take() {
                    let term = gloss.term.trim();
                    if !term.is_empty() {
                        self.terms.push(Term::new(term, gloss.translation.trim()));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close_segment(&mut self) -> Result<(), String> {
        let Some(segment) = self.segment.take() else {
            return Ok(());
        };
        let Some(source) = segment.source else {
            return Err(format!("段落 {} 缺少 <source>", segment.id));
        };

        if strip_markup(&source).trim().is_empty() {
            tracing::debug!("跳过空白段落 {}", segment.id);
            return Ok(());
        }

        let id = SegmentId::new(
            self.file.clone().unwrap_or_default(),
            self.unit.clone().unwrap_or_default(),
            segment.id,
        );
        self.ready.push_back(Segment {
            id,
            source,
            terms: self.terms.clone(),
        });
        Ok(())
    }

    /// 段落原文保留转义后的原始文本，术语取解码后的文本
    fn text(&mut self, text: &BytesText) -> Result<(), String> {
        if let Some(segment) = self.segment.as_mut() {
            if segment.in_source {
                if let Some(source) = segment.source.as_mut() {
                    source.push_str(utf8(text)?);
                }
                return Ok(());
            }
        }

        if self.gloss.as_ref().and_then(|g| g.field).is_some() {
            let decoded = text
                .unescape()
                .map_err(|e| format!("术语文本无效: {}", e))?;
            self.gloss_text(&decoded);
        }
        Ok(())
    }

    fn cdata(&mut self, data: &BytesCData) -> Result<(), String> {
        let content = utf8(data)?;
        if let Some(segment) = self.segment.as_mut() {
            if segment.in_source {
                if let Some(source) = segment.source.as_mut() {
                    source.push_str(&escape_text(content));
                }
                return Ok(());
            }
        }
        self.gloss_text(content);
        Ok(())
    }

    fn gloss_text(&mut self, text: &str) {
        if let Some(gloss) = self.gloss.as_mut() {
            match gloss.field {
                Some(GlossField::Term) => gloss.term.push_str(text),
                Some(GlossField::Translation) => gloss.translation.push_str(text),
                None => {}
            }
        }
    }

    fn eof(&mut self) {
        let open = if let Some(segment) = &self.segment {
            Some(format!("<segment id=\"{}\">", segment.id))
        } else if let Some(unit) = &self.unit {
            Some(format!("<unit id=\"{}\">", unit))
        } else {
            self.file.as_ref().map(|file| format!("<file id=\"{}\">", file))
        };

        if let Some(open) = open {
            self.structural(format!("文档在 {} 内意外结束", open));
        }
    }
}
