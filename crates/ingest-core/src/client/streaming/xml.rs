//! 承認待ち一覧のレガシー XML
//!
//! ```text
//! choicesAvailableForUnits
//! └─ choicesAvailableForUnit   (decision ごと)
//!    ├─ unit
//!    │  ├─ type
//!    │  └─ unitXML
//!    │     ├─ UUID            (package id)
//!    │     └─ currentPath
//!    ├─ UUID                  (decision id)
//!    └─ choices
//!       └─ choice
//!          ├─ chainAvailable
//!          └─ description
//! ```
//!
//! 旧クライアントがバイト単位で比較するので、宣言は `<?xml version='1.0' encoding='utf8'?>`、
//! 子のないコンテナ要素は `<choices/>` のように自己終了で書きます。

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::client::error::{ClientError, ClientResult};
use crate::domain::Decision;

const DECLARATION: &str = "xml version='1.0' encoding='utf8'";

struct Doc {
    writer: Writer<Vec<u8>>,
}

impl Doc {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> ClientResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| ClientError::Encoding(format!("xml: {e}")))
    }

    fn open(&mut self, name: &str) -> ClientResult<()> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn close(&mut self, name: &str) -> ClientResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> ClientResult<()> {
        self.event(Event::Empty(BytesStart::new(name)))
    }

    /// テキストが空でも `<name></name>` で書く
    fn leaf(&mut self, name: &str, text: &str) -> ClientResult<()> {
        self.open(name)?;
        if !text.is_empty() {
            self.event(Event::Text(BytesText::new(text)))?;
        }
        self.close(name)
    }

    fn finish(self) -> ClientResult<String> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| ClientError::Encoding(format!("xml: {e}")))
    }
}

fn write_decision(doc: &mut Doc, decision: &Decision) -> ClientResult<()> {
    doc.open("choicesAvailableForUnit")?;

    doc.open("unit")?;
    doc.leaf("type", decision.unit_type.as_str())?;
    doc.open("unitXML")?;
    doc.leaf("UUID", &decision.unit_id.to_string())?;
    doc.leaf("currentPath", &decision.unit_path)?;
    doc.close("unitXML")?;
    doc.close("unit")?;

    doc.leaf("UUID", &decision.id.to_string())?;

    if decision.choices.is_empty() {
        doc.empty("choices")?;
    } else {
        doc.open("choices")?;
        for choice in &decision.choices {
            doc.open("choice")?;
            doc.leaf("chainAvailable", &choice.chain_id)?;
            doc.leaf("description", &choice.label)?;
            doc.close("choice")?;
        }
        doc.close("choices")?;
    }

    doc.close("choicesAvailableForUnit")
}

/// 決定的な出力（入力順、インデント 2）
pub fn decisions_to_xml(decisions: &[Decision]) -> ClientResult<String> {
    let mut doc = Doc::new();
    doc.event(Event::Decl(BytesDecl::from_start(BytesStart::from_content(
        DECLARATION,
        3,
    ))))?;
    if decisions.is_empty() {
        doc.empty("choicesAvailableForUnits")?;
        return doc.finish();
    }
    doc.open("choicesAvailableForUnits")?;
    for decision in decisions {
        write_decision(&mut doc, decision)?;
    }
    doc.close("choicesAvailableForUnits")?;
    doc.finish()
}
