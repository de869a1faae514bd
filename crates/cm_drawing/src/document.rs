use cm_canvas::{CanvasError, ImageRef};
use thiserror::Error;

use crate::Page;

/// 文档结构错误
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("a review document needs at least one page")]
    Empty,

    #[error("cannot delete the only remaining page")]
    LastPage,

    #[error("page {index} out of range (document has {len} pages)")]
    PageOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// 评审文档：有序页面列表 + 当前活动页
///
/// 不变量：至少一页；`active` 始终是有效下标。
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDocument {
    pages: Vec<Page>,
    active: usize,
}

impl ReviewDocument {
    /// 从页面列表创建，活动页为第一页
    pub fn new(pages: Vec<Page>) -> Result<Self, DocumentError> {
        if pages.is_empty() {
            return Err(DocumentError::Empty);
        }
        Ok(Self { pages, active: 0 })
    }

    /// 新建评审：每个背景一页，墨迹层为空白透明层
    pub fn from_backgrounds<I>(backgrounds: I) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = ImageRef>,
    {
        let pages = backgrounds
            .into_iter()
            .map(Page::with_background)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(pages)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_page(&self) -> &Page {
        &self.pages[self.active]
    }

    pub fn active_page_mut(&mut self) -> &mut Page {
        &mut self.pages[self.active]
    }

    /// 切换活动页
    pub fn set_active(&mut self, index: usize) -> Result<(), DocumentError> {
        self.check_index(index)?;
        self.active = index;
        Ok(())
    }

    /// 追加页面并设为活动页，返回其下标
    pub fn push_page(&mut self, page: Page) -> usize {
        self.pages.push(page);
        self.active = self.pages.len() - 1;
        self.active
    }

    /// 删除页面
    ///
    /// 拒绝删除最后一页。删除活动页时活动页退到前一页（不小于 0）；
    /// 删除活动页之前的页时活动下标随之前移。
    pub fn remove_page(&mut self, index: usize) -> Result<Page, DocumentError> {
        self.check_index(index)?;
        if self.pages.len() == 1 {
            return Err(DocumentError::LastPage);
        }

        let removed = self.pages.remove(index);
        if self.active == index {
            self.active = index.saturating_sub(1);
        } else if self.active > index {
            self.active -= 1;
        }
        Ok(removed)
    }

    fn check_index(&self, index: usize) -> Result<(), DocumentError> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(DocumentError::PageOutOfRange {
                index,
                len: self.pages.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentError, ReviewDocument};
    use cm_canvas::ImageRef;

    fn doc(n: usize) -> ReviewDocument {
        ReviewDocument::from_backgrounds(
            (0..n).map(|i| ImageRef::Remote(format!("https://cdn.example/scan-{i}.png"))),
        )
        .unwrap()
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(matches!(ReviewDocument::new(Vec::new()), Err(DocumentError::Empty)));
    }

    #[test]
    fn last_page_cannot_be_deleted() {
        let mut d = doc(1);
        assert!(matches!(d.remove_page(0), Err(DocumentError::LastPage)));
        assert_eq!(d.page_count(), 1);
        assert_eq!(d.active_index(), 0);
    }

    #[test]
    fn deleting_active_page_moves_to_previous() {
        let mut d = doc(3);
        d.set_active(2).unwrap();
        d.remove_page(2).unwrap();
        assert_eq!(d.active_index(), 1);

        d.set_active(0).unwrap();
        d.remove_page(0).unwrap();
        assert_eq!(d.active_index(), 0);
        assert_eq!(d.page_count(), 1);
    }

    #[test]
    fn deleting_earlier_page_shifts_active() {
        let mut d = doc(4);
        d.set_active(3).unwrap();
        d.remove_page(1).unwrap();
        assert_eq!(d.active_index(), 2);
        assert_eq!(
            d.active_page().background,
            ImageRef::Remote("https://cdn.example/scan-3.png".into())
        );
    }

    #[test]
    fn active_index_stays_valid_for_every_deletion() {
        for len in 2..6 {
            for active in 0..len {
                for victim in 0..len {
                    let mut d = doc(len);
                    d.set_active(active).unwrap();
                    d.remove_page(victim).unwrap();
                    assert!(d.active_index() < d.page_count());
                }
            }
        }
    }

    #[test]
    fn push_page_becomes_active() {
        let mut d = doc(2);
        let index = d.push_page(crate::Page::blank().unwrap());
        assert_eq!(index, 2);
        assert_eq!(d.active_index(), 2);
    }

    #[test]
    fn out_of_range_is_reported() {
        let mut d = doc(2);
        assert!(matches!(
            d.set_active(5),
            Err(DocumentError::PageOutOfRange { index: 5, len: 2 })
        ));
        assert!(d.remove_page(9).is_err());
    }
}
