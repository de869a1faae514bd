//! 多文件导入的完成计数
//!
//! 每个文件读取完成时记录一次；全部完成后才产出一次结果，
//! 避免逐个文件地更新文档。

use cm_canvas::ImageRef;

/// 批量读取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// 全部成功，按原始文件顺序排列
    Complete(Vec<ImageRef>),
    /// 至少一个文件失败；文档不应被修改
    Failed(Vec<String>),
}

#[derive(Debug, Clone)]
enum Slot {
    Waiting,
    Ready(ImageRef),
    Failed,
}

/// 一批文件读取
#[derive(Debug)]
pub struct LoadBatch {
    slots: Vec<Slot>,
    errors: Vec<String>,
    remaining: usize,
}

impl LoadBatch {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![Slot::Waiting; len],
            errors: Vec::new(),
            remaining: len,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 记录第 `index` 个文件的结果；最后一个完成时返回整批结果
    ///
    /// 越界或重复的记录被忽略。
    pub fn record(&mut self, index: usize, result: Result<ImageRef, String>) -> Option<BatchOutcome> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.slots.get_mut(index)?;
        if !matches!(slot, Slot::Waiting) {
            return None;
        }

        match result {
            Ok(image) => *slot = Slot::Ready(image),
            Err(e) => {
                *slot = Slot::Failed;
                self.errors.push(e);
            }
        }
        self.remaining -= 1;

        if self.remaining > 0 {
            return None;
        }
        if !self.errors.is_empty() {
            return Some(BatchOutcome::Failed(std::mem::take(&mut self.errors)));
        }
        let images = std::mem::take(&mut self.slots)
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Ready(image) => Some(image),
                _ => None,
            })
            .collect();
        Some(BatchOutcome::Complete(images))
    }
}
