/// 提交生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// 可以提交
    #[default]
    Idle,
    /// 上传/提交请求进行中，提交按钮禁用
    InFlight,
}

/// 提交状态
#[derive(Debug, Default)]
pub struct Model {
    phase: Phase,
}

impl Model {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase == Phase::InFlight
    }

    pub fn start(&mut self) {
        self.phase = Phase::InFlight;
    }

    pub fn finish(&mut self) {
        self.phase = Phase::Idle;
    }
}
