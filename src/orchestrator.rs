//! レコード単位の差し込み処理
//!
//! 1レコードごとに次の順で処理する（順序は固定）:
//!
//! 1. テンプレート文字列を再パースして新しいツリーを作る
//! 2. レイヤーの表示/非表示
//! 3. 非表示レイヤーの削除（オプション）
//! 4. プロパティ列
//! 5. 要素値の列（テキスト・画像）
//! 6. 文字列に書き出す
//!
//! レコード単位のエラーはログに残して次のレコードへ進む。
//! バッチ全体を止めるのはレコード数の上限超過のみで、処理開始前に判定する。

use crate::applier::{
    apply_image, apply_layer_visibility, apply_property, apply_text, display_of, ApplyOutcome, ImageContext,
    RejectReason,
};
use crate::document::{Document, NodeId};
use crate::error::{InkMergeError, Result};
use crate::resolver::ElementResolver;
use crate::scanner::scan_document;
use ink_merge_common::{ClassificationResult, ElementIndex, ElementKind, HeaderTarget, Record, Visibility};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// 1バッチで処理できるレコード数の既定上限
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

/// 読み込み済みテンプレート（バッチ中は読み取り専用）
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    index: ElementIndex,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let doc = Document::parse(&source)?;
        let index = scan_document(&doc);
        Ok(Self { source, index })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InkMergeError::FileNotFound(path.display().to_string()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::parse(source)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn index(&self) -> &ElementIndex {
        &self.index
    }

    /// レコード用の新しいツリー
    pub fn instantiate(&self) -> Result<Document> {
        Document::parse(&self.source)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// 非表示になったレイヤーをツリーから削除する
    pub prune_hidden_layers: bool,
    pub image: ImageContext,
    pub max_records: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            prune_hidden_layers: false,
            image: ImageContext::default(),
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

/// レコード単位の統計（診断用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordStats {
    pub text_replaced: usize,
    pub images_replaced: usize,
    pub layers_modified: usize,
    pub layers_removed: usize,
    pub properties_modified: usize,
    /// 値が既に同じだった
    pub unchanged: usize,
    /// 検証で弾いた適用
    pub rejected: usize,
    /// 要素が見つからなかった
    pub errors: usize,
}

impl RecordStats {
    pub fn add(&mut self, other: &RecordStats) {
        self.text_replaced += other.text_replaced;
        self.images_replaced += other.images_replaced;
        self.layers_modified += other.layers_modified;
        self.layers_removed += other.layers_removed;
        self.properties_modified += other.properties_modified;
        self.unchanged += other.unchanged;
        self.rejected += other.rejected;
        self.errors += other.errors;
    }

    pub fn changes(&self) -> usize {
        self.text_replaced + self.images_replaced + self.layers_modified + self.layers_removed + self.properties_modified
    }
}

/// 書き出し済みの1レコード
#[derive(Debug, Clone)]
pub struct RenderedRecord {
    /// バッチ内の位置（0始まり）
    pub index: usize,
    pub document: String,
    pub stats: RecordStats,
    pub warnings: Vec<String>,
}

/// 書き出したドキュメントの受け取り先（ファイル出力など）
pub trait BatchSink {
    /// 出力した場合 `true`、既存ファイルを残すなどで出力しなかった場合 `false`
    fn deliver(&mut self, rendered: &RenderedRecord) -> Result<bool>;

    fn record_failed(&mut self, _index: usize, _error: &InkMergeError) {}
}

/// メモリ上に集めるだけの受け取り先
#[derive(Debug, Default)]
pub struct CollectSink {
    pub records: Vec<RenderedRecord>,
}

impl BatchSink for CollectSink {
    fn deliver(&mut self, rendered: &RenderedRecord) -> Result<bool> {
        self.records.push(rendered.clone());
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub requested: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub totals: RecordStats,
    /// (レコード位置, エラー内容)
    pub failures: Vec<(usize, String)>,
    /// (レコード位置, 警告)
    pub warnings: Vec<(usize, String)>,
}

pub struct Merger<'a> {
    template: &'a Template,
    classification: &'a ClassificationResult,
    options: &'a MergeOptions,
    resolver: ElementResolver,
}

/// 同じ要素名の列をまとめる（列順を保つ）
fn group_by_element<'t>(targets: impl Iterator<Item = &'t HeaderTarget>) -> Vec<(&'t str, Vec<&'t HeaderTarget>)> {
    let mut groups: Vec<(&str, Vec<&HeaderTarget>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for target in targets {
        let name = target.element_name.as_str();
        match positions.get(name) {
            Some(&pos) => groups[pos].1.push(target),
            None => {
                positions.insert(name, groups.len());
                groups.push((name, vec![target]));
            }
        }
    }
    groups
}

struct RecordRun {
    doc: Document,
    stats: RecordStats,
    warnings: Vec<String>,
}

impl RecordRun {
    fn resolve(&mut self, resolver: &ElementResolver, name: &str) -> Vec<NodeId> {
        let nodes = resolver.resolve(&self.doc, name);
        if nodes.is_empty() {
            self.stats.errors += 1;
            self.warnings.push(format!("要素が見つかりません: {}", name));
            log::warn!("要素が見つかりません: {}", name);
        }
        nodes
    }

    /// 結果を集計し、変更があったかを返す
    fn tally(&mut self, header: &str, outcome: ApplyOutcome) -> bool {
        match outcome {
            ApplyOutcome::Changed => true,
            ApplyOutcome::Unchanged => {
                self.stats.unchanged += 1;
                false
            }
            ApplyOutcome::Rejected(reason) => {
                self.stats.rejected += 1;
                self.warnings.push(format!("{}: {}", header, reason));
                false
            }
        }
    }
}

impl<'a> Merger<'a> {
    pub fn new(template: &'a Template, classification: &'a ClassificationResult, options: &'a MergeOptions) -> Self {
        Self {
            template,
            classification,
            options,
            resolver: ElementResolver::default(),
        }
    }

    /// 1レコードを処理して書き出し済みの文字列を返す
    pub fn process_record(&self, index: usize, record: &Record) -> Result<RenderedRecord> {
        let mut run = RecordRun {
            doc: self.template.instantiate()?,
            stats: RecordStats::default(),
            warnings: Vec::new(),
        };

        self.apply_visibility(&mut run, record);
        if self.options.prune_hidden_layers {
            self.prune_hidden_layers(&mut run);
        }
        self.apply_properties(&mut run, record);
        self.apply_values(&mut run, record);

        let document = run.doc.serialize();
        self.resolver.invalidate(&run.doc);

        Ok(RenderedRecord {
            index,
            document,
            stats: run.stats,
            warnings: run.warnings,
        })
    }

    fn apply_visibility(&self, run: &mut RecordRun, record: &Record) {
        for (name, targets) in group_by_element(self.classification.layer_headers()) {
            let nodes = run.resolve(&self.resolver, name);
            for target in targets {
                let Some(value) = record.get(&target.header) else {
                    continue;
                };
                for &node in &nodes {
                    let outcome = apply_layer_visibility(&mut run.doc, node, value);
                    if run.tally(&target.header, outcome) {
                        run.stats.layers_modified += 1;
                    }
                }
            }
        }
    }

    /// 非表示のレイヤーをツリーから取り除く（入れ子は外側だけ数える）
    fn prune_hidden_layers(&self, run: &mut RecordRun) {
        let hidden: Vec<NodeId> = run
            .doc
            .elements()
            .into_iter()
            .filter(|&n| run.doc.is_layer(n) && display_of(&run.doc, n) == Visibility::Hidden)
            .collect();

        for node in hidden {
            if !run.doc.is_attached(node) {
                continue;
            }
            let name = run
                .doc
                .label(node)
                .or_else(|| run.doc.element_id(node))
                .unwrap_or("(名前なし)")
                .to_string();
            if run.doc.detach(node) {
                log::debug!("非表示レイヤーを削除: {}", name);
                run.stats.layers_removed += 1;
            }
        }

        if run.stats.layers_removed > 0 {
            self.resolver.invalidate(&run.doc);
        }
    }

    fn apply_properties(&self, run: &mut RecordRun, record: &Record) {
        for (name, targets) in group_by_element(self.classification.property_targets()) {
            let nodes = run.resolve(&self.resolver, name);
            for target in targets {
                let (Some(value), Some(property)) = (record.get(&target.header), target.property_name.as_deref())
                else {
                    continue;
                };
                for &node in &nodes {
                    let outcome = apply_property(&mut run.doc, node, property, value);
                    if run.tally(&target.header, outcome) {
                        run.stats.properties_modified += 1;
                    }
                }
            }
        }
    }

    fn apply_values(&self, run: &mut RecordRun, record: &Record) {
        for (name, targets) in group_by_element(self.classification.value_headers()) {
            let nodes = run.resolve(&self.resolver, name);
            for target in targets {
                let Some(value) = record.get(&target.header) else {
                    continue;
                };
                for &node in &nodes {
                    self.apply_value(run, target, node, value);
                }
            }
        }
    }

    /// 列の種類（なければ実際のタグ）でテキスト/画像を振り分ける
    fn apply_value(&self, run: &mut RecordRun, target: &HeaderTarget, node: NodeId, value: &str) {
        let is_text = target.element_kind == ElementKind::Text || run.doc.is_text_container(node);
        let is_image = target.element_kind == ElementKind::Image || run.doc.local_name(node) == Some("image");

        if is_text && target.element_kind != ElementKind::Image {
            let outcome = apply_text(&mut run.doc, node, value);
            if run.tally(&target.header, outcome) {
                run.stats.text_replaced += 1;
            }
        } else if is_image {
            let outcome = apply_image(&mut run.doc, node, value, &self.options.image);
            if run.tally(&target.header, outcome) {
                run.stats.images_replaced += 1;
            }
        } else {
            let tag = run.doc.local_name(node).unwrap_or_default().to_string();
            log::debug!("'{}' は値を書き込める要素ではありません（{}）", target.header, target.element_kind);
            run.tally(&target.header, ApplyOutcome::Rejected(RejectReason::NotApplicable(tag)));
        }
    }

    /// 全レコードを処理して `sink` に渡す
    pub fn process_batch(&self, records: &[Record], sink: &mut dyn BatchSink) -> Result<BatchReport> {
        if records.len() > self.options.max_records {
            return Err(InkMergeError::TooManyRecords {
                count: records.len(),
                limit: self.options.max_records,
            });
        }

        let mut report = BatchReport {
            requested: records.len(),
            ..Default::default()
        };

        for (index, record) in records.iter().enumerate() {
            let rendered = match self.process_record(index, record) {
                Ok(r) => r,
                Err(e) => {
                    log::error!("レコード {} の処理に失敗: {}", index + 1, e);
                    report.failed += 1;
                    report.failures.push((index, e.to_string()));
                    sink.record_failed(index, &e);
                    continue;
                }
            };

            report.totals.add(&rendered.stats);
            report
                .warnings
                .extend(rendered.warnings.iter().map(|w| (index, w.clone())));

            match sink.deliver(&rendered) {
                Ok(true) => report.generated += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    log::error!("レコード {} の出力に失敗: {}", index + 1, e);
                    report.failed += 1;
                    report.failures.push((index, e.to_string()));
                    sink.record_failed(index, &e);
                }
            }
        }

        log::info!(
            "バッチ完了: {}/{}件 出力（スキップ {}件, 失敗 {}件）",
            report.generated,
            report.requested,
            report.skipped,
            report.failed
        );
        Ok(report)
    }
}
