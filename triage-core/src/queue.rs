//! Chia hàng đợi chưa phân loại / đã phân loại và sắp xếp thứ tự.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::patient::{Assessment, Patient};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Unscheduled,
    Scheduled,
}

/// Hàng đợi của bệnh nhân, suy ra từ (status, triageLevel). `None` nếu ngoài hàng đợi.
pub fn queue_membership(patient: &Patient) -> Option<QueueKind> {
    if !patient.status.is_active_queue() {
        return None;
    }
    Some(match patient.assessment() {
        Assessment::Unassessed => QueueKind::Unscheduled,
        Assessment::Assessed(_) => QueueKind::Scheduled,
    })
}

/// Hai hàng đợi làm việc của bảng điều khiển.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Queues {
    pub unscheduled: Vec<Patient>,
    pub scheduled: Vec<Patient>,
}

/// Số lượng hiển thị trên đầu bảng điều khiển.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueSummary {
    pub unscheduled: usize,
    pub scheduled: usize,
    pub requires_immediate: usize,
}

impl Queues {
    pub fn summary(&self) -> QueueSummary {
        QueueSummary {
            unscheduled: self.unscheduled.len(),
            scheduled: self.scheduled.len(),
            requires_immediate: self
                .unscheduled
                .iter()
                .chain(&self.scheduled)
                .filter(|patient| patient.requires_immediate)
                .count(),
        }
    }

    pub fn len(&self) -> usize {
        self.unscheduled.len() + self.scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lọc theo tên hoặc triệu chứng, giữ nguyên thứ tự.
    pub fn filter(self, query: &str) -> Queues {
        Queues {
            unscheduled: filter_patients(self.unscheduled, query),
            scheduled: filter_patients(self.scheduled, query),
        }
    }
}

/// Thứ tự trong một hàng đợi: ghim trước; trong cùng tầng ghim, thứ hạng
/// thủ công trước, sau đó mức khẩn, rồi thời điểm đăng ký sớm hơn.
pub fn queue_order(a: &Patient, b: &Patient) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| match (a.manual_order, b.manual_order) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.triage_level.cmp(&b.triage_level),
        })
        .then_with(|| a.registered_at.cmp(&b.registered_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Chia bệnh nhân vào hai hàng đợi. Hàm thuần, tính lại mỗi lần đọc.
pub fn partition_queues<'a, I>(patients: I) -> Queues
where
    I: IntoIterator<Item = &'a Patient>,
{
    let mut queues = Queues::default();
    for patient in patients {
        match queue_membership(patient) {
            Some(QueueKind::Unscheduled) => queues.unscheduled.push(patient.clone()),
            Some(QueueKind::Scheduled) => queues.scheduled.push(patient.clone()),
            None => {}
        }
    }
    queues.unscheduled.sort_by(queue_order);
    queues.scheduled.sort_by(queue_order);
    queues
}

pub fn filter_patients(patients: Vec<Patient>, query: &str) -> Vec<Patient> {
    patients
        .into_iter()
        .filter(|patient| patient.matches_query(query))
        .collect()
}
