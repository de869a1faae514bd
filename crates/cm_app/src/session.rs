/// 当前会话的只读上下文
///
/// 由宿主注入；编辑器只用它给上传文件命名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: u64,
    pub solution_id: u64,
}

impl SessionContext {
    pub fn new(user_id: u64, solution_id: u64) -> Self {
        Self {
            user_id,
            solution_id,
        }
    }

    /// 上传文件名前缀 `{user}-{solution}-{page}`
    pub fn file_stem(&self, page_index: usize) -> String {
        format!("{}-{}-{}", self.user_id, self.solution_id, page_index)
    }
}
