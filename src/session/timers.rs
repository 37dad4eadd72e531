//! 会话计时器
//!
//! 单线程、协作式：计时器只是"某个时刻要执行的动作"，由宿主推进虚拟时钟
//! （测试里直接推进，浏览器模式下按真实时间推进）。同一时刻到期的计时器按登记顺序执行。

use crate::autofill::toast::ToastId;
use crate::dom::NodeId;
use std::collections::{BTreeMap, HashMap};

/// 计时器编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// 计时器到期时要执行的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// 高亮恢复（只在会话号仍匹配时生效）
    RevertHighlight { node: NodeId, session: u64 },
    /// 提示进入动画
    ToastEnter(ToastId),
    /// 提示自动消失
    ToastDismiss(ToastId),
    /// 提示退出动画结束，移除元素
    ToastRemove(ToastId),
}

/// 会话范围的计时器集合
#[derive(Debug, Default)]
pub struct TimerSet {
    now: u64,
    next_id: u64,
    pending: BTreeMap<(u64, TimerId), TimerAction>,
    deadlines: HashMap<TimerId, u64>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前虚拟时间（毫秒）
    pub fn now(&self) -> u64 {
        self.now
    }

    /// 登记一个 `delay_ms` 后到期的计时器
    pub fn schedule(&mut self, delay_ms: u64, action: TimerAction) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let deadline = self.now.saturating_add(delay_ms);
        self.pending.insert((deadline, id), action);
        self.deadlines.insert(id, deadline);
        id
    }

    /// 取消计时器；已触发或不存在时返回 false
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.pending.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    /// 取消全部计时器，返回取消数量
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        self.deadlines.clear();
        count
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// 最近一个到期时间
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// 弹出不晚于 `until` 的最早计时器，并把时钟拨到它的到期时刻
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, TimerAction)> {
        let (&(deadline, id), _) = self.pending.iter().next()?;
        if deadline > until {
            return None;
        }
        let action = self.pending.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(deadline);
        Some((id, action))
    }

    /// 把时钟拨到 `time`（不会倒退）
    pub fn advance_clock(&mut self, time: u64) {
        self.now = self.now.max(time);
    }
}
