//! Order and reservation lifecycles.
//!
//! Both machines move forward along a fixed path, may skip steps, and have
//! terminal states. Re-applying the current status is accepted as a no-op.

use crate::services::error::{ServiceError, ServiceResult};
use crate::types::{OrderStatus, ReservationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Advance,
}

const ORDER_PATH: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
    OrderStatus::Completed,
];

const RESERVATION_PATH: &[ReservationStatus] = &[
    ReservationStatus::Pending,
    ReservationStatus::Confirmed,
    ReservationStatus::Seated,
    ReservationStatus::Completed,
];

fn position<T: PartialEq>(path: &[T], status: &T) -> Option<usize> {
    path.iter().position(|s| s == status)
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Statuses the kitchen and floor still have to act on.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Confirmed
                | OrderStatus::Preparing
                | OrderStatus::Ready
                | OrderStatus::OutForDelivery
        )
    }

    pub fn transition_to(self, next: OrderStatus) -> ServiceResult<Transition> {
        if self == next {
            return Ok(Transition::Unchanged);
        }
        let allowed = !self.is_terminal()
            && (next == OrderStatus::Cancelled
                || matches!(
                    (position(ORDER_PATH, &self), position(ORDER_PATH, &next)),
                    (Some(from), Some(to)) if to > from
                ));
        if allowed {
            Ok(Transition::Advance)
        } else {
            Err(ServiceError::precondition(format!(
                "Order cannot move from {} to {}",
                self, next
            )))
        }
    }
}

impl ReservationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled | ReservationStatus::NoShow
        )
    }

    /// Counts against its time slot's capacity. Only cancellation frees the place.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }

    /// Guests still expected to turn up or already seated.
    pub fn expects_guests(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled | ReservationStatus::NoShow)
    }

    pub fn transition_to(self, next: ReservationStatus) -> ServiceResult<Transition> {
        if self == next {
            return Ok(Transition::Unchanged);
        }
        let allowed = match next {
            ReservationStatus::Cancelled | ReservationStatus::NoShow => {
                matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
            }
            _ => {
                !self.is_terminal()
                    && matches!(
                        (position(RESERVATION_PATH, &self), position(RESERVATION_PATH, &next)),
                        (Some(from), Some(to)) if to > from
                    )
            }
        };
        if allowed {
            Ok(Transition::Advance)
        } else {
            Err(ServiceError::precondition(format!(
                "Reservation cannot move from {} to {}",
                self, next
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_advance_and_may_skip_steps() {
        assert_eq!(
            OrderStatus::Pending.transition_to(OrderStatus::Confirmed).unwrap(),
            Transition::Advance
        );
        assert_eq!(
            OrderStatus::Ready.transition_to(OrderStatus::Completed).unwrap(),
            Transition::Advance
        );
    }

    #[test]
    fn orders_never_regress() {
        assert!(matches!(
            OrderStatus::Delivered.transition_to(OrderStatus::Pending),
            Err(ServiceError::PreconditionFailed(_))
        ));
        assert!(OrderStatus::Ready.transition_to(OrderStatus::Preparing).is_err());
    }

    #[test]
    fn cancellation_only_before_a_terminal_state() {
        for status in OrderStatus::ALL {
            let result = status.transition_to(OrderStatus::Cancelled);
            match status {
                OrderStatus::Cancelled => assert_eq!(result.unwrap(), Transition::Unchanged),
                OrderStatus::Completed => assert!(result.is_err()),
                _ => assert_eq!(result.unwrap(), Transition::Advance),
            }
        }
        assert!(OrderStatus::Cancelled.transition_to(OrderStatus::Confirmed).is_err());
    }

    #[test]
    fn same_status_is_a_no_op() {
        assert_eq!(
            OrderStatus::Completed.transition_to(OrderStatus::Completed).unwrap(),
            Transition::Unchanged
        );
        assert_eq!(
            ReservationStatus::Seated.transition_to(ReservationStatus::Seated).unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn reservations_follow_their_path() {
        assert!(ReservationStatus::Pending.transition_to(ReservationStatus::Seated).is_ok());
        assert!(ReservationStatus::Confirmed.transition_to(ReservationStatus::Completed).is_ok());
        assert!(ReservationStatus::Seated.transition_to(ReservationStatus::Confirmed).is_err());
    }

    #[test]
    fn reservation_cancel_and_no_show_need_an_open_booking() {
        for to in [ReservationStatus::Cancelled, ReservationStatus::NoShow] {
            assert!(ReservationStatus::Pending.transition_to(to).is_ok());
            assert!(ReservationStatus::Confirmed.transition_to(to).is_ok());
            assert!(ReservationStatus::Seated.transition_to(to).is_err());
            assert!(ReservationStatus::Completed.transition_to(to).is_err());
        }
        assert!(ReservationStatus::NoShow.transition_to(ReservationStatus::Cancelled).is_err());
        assert!(ReservationStatus::Cancelled.transition_to(ReservationStatus::Confirmed).is_err());
    }

    #[test]
    fn only_cancellation_frees_a_slot() {
        for status in ReservationStatus::ALL {
            assert_eq!(status.occupies_slot(), *status != ReservationStatus::Cancelled);
        }
        assert!(!ReservationStatus::NoShow.expects_guests());
        assert!(ReservationStatus::Seated.expects_guests());
    }
}
