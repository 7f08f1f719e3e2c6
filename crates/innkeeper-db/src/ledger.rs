//! # Booking Ledger
//!
//! Every booking transition and its room side effects, one SQLite
//! transaction each.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN IMMEDIATE                                                        │
//! │    load booking (+ version check)  ─┐                                   │
//! │    load room                        │  all on the tx connection         │
//! │    apply state machine (core)       │                                   │
//! │    check_invariants()               │                                   │
//! │    UPDATE bookings ... version = ?  │                                   │
//! │    UPDATE rooms    ... version = ?  │                                   │
//! │    INSERT room_status_log           ┘                                   │
//! │  COMMIT                    (any error drops the tx → ROLLBACK)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Room Side Effects
//! ```text
//! create (same day)  → room occupied,  log "Guest checked in"
//! confirm            → room occupied,  log "Advance booking confirmed"
//! edit (room moved)  → old room released if nothing else holds it
//! cancel             → room released if available
//! check out          → room cleaning,  log "Guest checked out"
//! mark cleaned       → room available, latest cleaning entry stamped
//! ```

use chrono::{DateTime, Utc};
use innkeeper_core::{
    Booking, BookingRevision, BookingStatus, Cancellation, Clock, CoreError, Extension, ExtensionOutcome, Money,
    NewBooking, PaymentSplit, Room, RoomEvent, RoomStatus, RoomStatusLog,
};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{DbResult, LedgerResult};
use crate::pool::begin_write;
use crate::repository::{booking, guest, room, settings, status_log, EntityRef};

/// Runs booking and room transitions.
#[derive(Clone)]
pub struct BookingLedger {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl BookingLedger {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        BookingLedger { pool, clock }
    }

    // =========================================================================
    // Booking transitions
    // =========================================================================

    /// Books a room for a guest.
    ///
    /// A check-in after today (or a booking flagged advance) is `reserved`
    /// and leaves the room alone. Otherwise the guest is checked in now and
    /// the room becomes occupied.
    pub async fn create_booking(&self, input: NewBooking) -> LedgerResult<Booking> {
        let now = self.clock.now();
        let mut tx = begin_write(&self.pool).await?;

        let mut room = load_room(&mut tx, EntityRef::from(&input.room_id)).await?;
        if guest::fetch(&mut *tx, &input.guest_id).await?.is_none() {
            return Err(CoreError::GuestNotFound(input.guest_id).into());
        }
        let default_rate = settings::load_gst_rate(&mut *tx).await?;

        let booking = input.into_booking(&room, default_rate, now)?;
        booking.check_invariants()?;
        booking::insert(&mut *tx, &booking).await?;

        if booking.status == BookingStatus::CheckedIn {
            room.transition(RoomEvent::GuestCheckedIn)?;
            save_room(&mut tx, &mut room, Some(booking.id.as_str()), "Guest checked in", now.with_timezone(&Utc)).await?;
        }

        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            room_number = %room.room_number,
            status = %booking.status,
            total = %booking.total_amount(),
            "Booking created"
        );
        Ok(booking)
    }

    /// Checks in the guest of an advance booking, on or after its check-in date.
    pub async fn confirm_advance_booking<'a>(&self, target: impl Into<EntityRef<'a>>) -> LedgerResult<Booking> {
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let mut tx = begin_write(&self.pool).await?;

        let mut booking = load_booking(&mut tx, target.into()).await?;
        let mut room = load_room(&mut tx, EntityRef::from(&booking.room_id)).await?;

        booking.confirm(now)?;
        room.ensure_available()?;
        room.transition(RoomEvent::GuestCheckedIn)?;

        save_booking(&mut tx, &mut booking, now_utc).await?;
        save_room(&mut tx, &mut room, Some(booking.id.as_str()), "Advance booking confirmed", now_utc).await?;

        tx.commit().await?;

        info!(booking_id = %booking.id, room_number = %room.room_number, "Advance booking confirmed");
        Ok(booking)
    }

    /// Edits a reservation. Moving it to another room frees the old one
    /// unless another reservation or a stay still holds it.
    pub async fn update_advance_booking<'a>(
        &self,
        target: impl Into<EntityRef<'a>>,
        revision: BookingRevision,
    ) -> LedgerResult<Booking> {
        let now = self.clock.now_utc();
        let mut tx = begin_write(&self.pool).await?;

        let mut booking = load_booking(&mut tx, target.into()).await?;
        let old_room_id = booking.room_id.clone();
        let new_room_id = revision.room_id.clone().unwrap_or_else(|| old_room_id.clone());
        let new_room = load_room(&mut tx, EntityRef::from(&new_room_id)).await?;

        booking.revise(revision, &new_room)?;
        save_booking(&mut tx, &mut booking, now).await?;

        if new_room.id != old_room_id {
            let mut old_room = load_room(&mut tx, EntityRef::from(&old_room_id)).await?;
            let others = booking::count_other_reservations(&mut *tx, &old_room.id, &booking.id).await?;

            if old_room.status == RoomStatus::Available && others == 0 {
                old_room.transition(RoomEvent::Released)?;
                let note = format!("Reservation moved to room {}", new_room.room_number);
                save_room(&mut tx, &mut old_room, Some(booking.id.as_str()), &note, now).await?;
            } else {
                debug!(
                    room_number = %old_room.room_number,
                    status = %old_room.status,
                    other_reservations = others,
                    "Previous room still held, not released"
                );
            }
        }

        tx.commit().await?;

        info!(booking_id = %booking.id, room_number = %new_room.room_number, "Advance booking updated");
        Ok(booking)
    }

    /// Cancels a reservation, keeping `cancellation_charge` of what was paid.
    pub async fn cancel_advance_booking<'a>(
        &self,
        target: impl Into<EntityRef<'a>>,
        cancellation_charge: Money,
    ) -> LedgerResult<Cancellation> {
        let now = self.clock.now_utc();
        let mut tx = begin_write(&self.pool).await?;

        let mut booking = load_booking(&mut tx, target.into()).await?;
        let mut room = load_room(&mut tx, EntityRef::from(&booking.room_id)).await?;

        let refund = booking.cancel(cancellation_charge, now)?;
        save_booking(&mut tx, &mut booking, now).await?;

        if room.status == RoomStatus::Available {
            room.transition(RoomEvent::Released)?;
            save_room(&mut tx, &mut room, Some(booking.id.as_str()), "Booking cancelled - room available", now).await?;
        }

        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            charge = %cancellation_charge,
            refund = %refund,
            "Advance booking cancelled"
        );
        Ok(Cancellation { booking, refund })
    }

    /// Ends a stay today; the room goes to cleaning.
    pub async fn check_out<'a>(&self, target: impl Into<EntityRef<'a>>) -> LedgerResult<Booking> {
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let mut tx = begin_write(&self.pool).await?;

        let mut booking = load_booking(&mut tx, target.into()).await?;
        let mut room = load_room(&mut tx, EntityRef::from(&booking.room_id)).await?;

        booking.check_out(now)?;
        room.transition(RoomEvent::GuestCheckedOut)?;

        save_booking(&mut tx, &mut booking, now_utc).await?;
        save_room(&mut tx, &mut room, Some(booking.id.as_str()), "Guest checked out", now_utc).await?;

        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            room_number = %room.room_number,
            nights = booking.nights_billed(),
            outstanding = %booking.outstanding(),
            "Guest checked out"
        );
        Ok(booking)
    }

    /// Adds nights to a checked-in stay.
    pub async fn extend_booking<'a>(
        &self,
        target: impl Into<EntityRef<'a>>,
        extension: Extension,
    ) -> LedgerResult<ExtensionOutcome> {
        let now = self.clock.now_utc();
        let mut tx = begin_write(&self.pool).await?;

        let mut booking = load_booking(&mut tx, target.into()).await?;
        let charge = booking.extend(&extension)?;
        save_booking(&mut tx, &mut booking, now).await?;

        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            additional_days = charge.additional_days,
            added = %charge.total,
            check_out_date = ?booking.check_out_date,
            "Booking extended"
        );
        Ok(ExtensionOutcome { booking, charge })
    }

    /// Takes a payment; anything above the balance is trimmed off,
    /// keeping the cash:QR ratio.
    pub async fn update_payment<'a>(&self, target: impl Into<EntityRef<'a>>, split: PaymentSplit) -> LedgerResult<Booking> {
        let now = self.clock.now_utc();
        let mut tx = begin_write(&self.pool).await?;

        let mut booking = load_booking(&mut tx, target.into()).await?;
        let applied = booking.add_payment(split)?;
        save_booking(&mut tx, &mut booking, now).await?;

        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            cash = %applied.cash,
            qr = %applied.qr,
            outstanding = %booking.outstanding(),
            "Payment recorded"
        );
        Ok(booking)
    }

    // =========================================================================
    // Housekeeping
    // =========================================================================

    /// Cleaning → available, stamping the room's latest cleaning entry.
    pub async fn mark_room_cleaned<'a>(&self, target: impl Into<EntityRef<'a>>) -> LedgerResult<Room> {
        let now = self.clock.now_utc();
        let mut tx = begin_write(&self.pool).await?;

        let mut room = load_room(&mut tx, target.into()).await?;
        room.transition(RoomEvent::Cleaned)?;
        room::update(&mut *tx, &mut room, now).await?;
        if !status_log::stamp_latest_cleaning(&mut *tx, &room.id, now).await? {
            // Cleaning set outside the ledger (imported data, manual SQL)
            warn!(room_number = %room.room_number, "No cleaning entry to stamp");
        }

        tx.commit().await?;

        info!(room_number = %room.room_number, "Room cleaned");
        Ok(room)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

async fn load_booking(conn: &mut SqliteConnection, target: EntityRef<'_>) -> LedgerResult<Booking> {
    let booking = booking::fetch(&mut *conn, target.id)
        .await?
        .ok_or_else(|| CoreError::BookingNotFound(target.id.to_string()))?;
    target.check_version("Booking", booking.version)?;
    Ok(booking)
}

async fn load_room(conn: &mut SqliteConnection, target: EntityRef<'_>) -> LedgerResult<Room> {
    let room = room::fetch(&mut *conn, target.id)
        .await?
        .ok_or_else(|| CoreError::RoomNotFound(target.id.to_string()))?;
    target.check_version("Room", room.version)?;
    Ok(room)
}

/// Checks the money invariants, then writes.
async fn save_booking(conn: &mut SqliteConnection, booking: &mut Booking, now: DateTime<Utc>) -> LedgerResult<()> {
    booking.check_invariants()?;
    booking::update(&mut *conn, booking, now).await?;
    Ok(())
}

/// Writes the room and appends its new status to the audit trail.
async fn save_room(
    conn: &mut SqliteConnection,
    room: &mut Room,
    booking_id: Option<&str>,
    note: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    room::update(&mut *conn, room, now).await?;
    let entry = RoomStatusLog::record(&room.id, booking_id, room.status, Some(note.to_string()), now);
    status_log::insert(&mut *conn, &entry).await
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, FixedOffset, NaiveDate, TimeZone};
    use innkeeper_core::guest::NewGuest;
    use innkeeper_core::{ErrorKind, FixedClock, Floor, GstRate, NewRoom, PaymentMethod, ProofType, RoomType};

    struct Desk {
        db: Database,
        clock: Arc<FixedClock>,
        room: Room,
        guest_id: String,
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2026, 3, day, hour, minute, 0)
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn rupees(r: i64) -> Money {
        Money::from_rupees(r)
    }

    async fn desk() -> Desk {
        desk_on(DbConfig::in_memory()).await
    }

    async fn desk_on(config: DbConfig) -> Desk {
        let clock = Arc::new(FixedClock::new(at(10, 14, 0)));
        let db = Database::with_clock(config, clock.clone()).await.unwrap();
        let room = add_room(&db, "101").await;
        let guest = db
            .guests()
            .create(NewGuest {
                name: "Asha Rao".to_string(),
                address: "12 MG Road, Mysuru".to_string(),
                proof_type: Some(ProofType::Aadhar),
                proof_number: Some("123456789012".to_string()),
                phone: Some("9876543210".to_string()),
                email: None,
            })
            .await
            .unwrap();

        Desk {
            db,
            clock,
            room,
            guest_id: guest.id,
        }
    }

    async fn add_room(db: &Database, number: &str) -> Room {
        db.rooms()
            .create(NewRoom {
                room_number: number.to_string(),
                floor: Floor::Ground,
                room_type: RoomType::Standard,
                max_occupancy: 2,
            })
            .await
            .unwrap()
    }

    impl Desk {
        fn booking(&self, check_in: NaiveDate, paid: PaymentSplit) -> NewBooking {
            NewBooking {
                room_id: self.room.id.clone(),
                guest_id: self.guest_id.clone(),
                check_in_date: check_in,
                check_out_date: Some(check_in + Duration::days(1)),
                number_of_guests: 2,
                base_amount: rupees(1000),
                gst_rate: None,
                payment: paid,
                gstin: None,
                is_advance_booking: None,
            }
        }

        async fn room_now(&self) -> Room {
            self.db.rooms().get_by_id(&self.room.id).await.unwrap().unwrap()
        }

        async fn stored(&self, id: &str) -> Booking {
            self.db.bookings().get_by_id(id).await.unwrap().unwrap()
        }

        async fn history(&self, room_id: &str) -> Vec<RoomStatusLog> {
            self.db.status_log().for_room(room_id, 50).await.unwrap()
        }
    }

    fn assert_balanced(booking: &Booking) {
        assert_eq!(booking.qr_amount() + booking.cash_amount(), booking.amount_paid());
        assert!(booking.amount_paid() <= booking.total_amount());
    }

    // -------------------------------------------------------------------------
    // create
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_tomorrow_reserves_and_leaves_room() {
        let desk = desk().await;
        let booking = desk
            .db
            .ledger()
            .create_booking(desk.booking(date(11), PaymentSplit::cash(rupees(500))))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Reserved);
        assert!(booking.actual_check_in_time.is_none());
        assert_eq!(desk.room_now().await.status, RoomStatus::Available);
        assert!(desk.history(&desk.room.id).await.is_empty());
        assert_balanced(&booking);
    }

    #[tokio::test]
    async fn test_create_today_checks_in_and_occupies_room() {
        let desk = desk().await;
        let booking = desk
            .db
            .ledger()
            .create_booking(desk.booking(date(10), PaymentSplit::new(rupees(500), rupees(200))))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::CheckedIn);
        assert_eq!(booking.actual_check_in_time, Some(at(10, 14, 0)));
        assert_eq!(booking.gst_amount(), rupees(180));
        assert_eq!(booking.total_amount(), rupees(1180));
        assert_eq!(booking.payment_method, PaymentMethod::Mixed);
        assert_balanced(&booking);

        let room = desk.room_now().await;
        assert_eq!(room.status, RoomStatus::Occupied);
        assert_eq!(room.version, desk.room.version + 1);

        let history = desk.history(&desk.room.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, RoomStatus::Occupied);
        assert_eq!(history[0].booking_id.as_deref(), Some(booking.id.as_str()));

        let stored = desk.stored(&booking.id).await;
        assert_eq!(stored.version, booking.version);
        assert_eq!(stored.total_amount_paise, booking.total_amount_paise);
        assert_eq!(stored.actual_check_in_time, booking.actual_check_in_time);
    }

    #[tokio::test]
    async fn test_create_uses_configured_gst_rate() {
        let desk = desk().await;
        desk.db.settings().set_gst_rate(12.0).await.unwrap();

        let booking = desk
            .db
            .ledger()
            .create_booking(desk.booking(date(12), PaymentSplit::none()))
            .await
            .unwrap();
        assert_eq!(booking.gst_rate(), GstRate::from_bps(1200));
        assert_eq!(booking.total_amount(), rupees(1120));
    }

    #[tokio::test]
    async fn test_create_rejections_write_nothing() {
        let desk = desk().await;
        let ledger = desk.db.ledger();

        let mut crowded = desk.booking(date(10), PaymentSplit::none());
        crowded.number_of_guests = 3;
        let err = ledger.create_booking(crowded).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let overpaid = desk.booking(date(10), PaymentSplit::cash(rupees(1181)));
        assert!(matches!(
            ledger.create_booking(overpaid).await,
            Err(crate::LedgerError::Core(CoreError::PaymentExceedsDue { .. }))
        ));

        let mut stranger = desk.booking(date(10), PaymentSplit::none());
        stranger.guest_id = "no-such-guest".to_string();
        assert_eq!(ledger.create_booking(stranger).await.unwrap_err().kind(), ErrorKind::NotFound);

        let mut nowhere = desk.booking(date(10), PaymentSplit::none());
        nowhere.room_id = "no-such-room".to_string();
        assert_eq!(ledger.create_booking(nowhere).await.unwrap_err().kind(), ErrorKind::NotFound);

        let mut backwards = desk.booking(date(10), PaymentSplit::none());
        backwards.check_out_date = Some(date(10));
        assert!(ledger.create_booking(backwards).await.is_err());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(desk.db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(desk.room_now().await.status, RoomStatus::Available);
    }

    #[tokio::test]
    async fn test_same_day_booking_needs_available_room() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();

        let err = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateViolation);

        // An advance booking for an occupied room is fine
        ledger
            .create_booking(desk.booking(date(15), PaymentSplit::none()))
            .await
            .unwrap();
    }

    // -------------------------------------------------------------------------
    // confirm
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_confirm_waits_for_check_in_date() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let booking = ledger
            .create_booking(desk.booking(date(12), PaymentSplit::none()))
            .await
            .unwrap();

        let err = ledger.confirm_advance_booking(&booking).await.unwrap_err();
        assert!(matches!(err, crate::LedgerError::Core(CoreError::CheckInDateNotReached { .. })));

        desk.clock.set(at(12, 9, 30));
        let confirmed = ledger.confirm_advance_booking(&booking).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::CheckedIn);
        assert_eq!(confirmed.actual_check_in_time, Some(at(12, 9, 30)));
        assert_eq!(confirmed.version, booking.version + 1);

        assert_eq!(desk.room_now().await.status, RoomStatus::Occupied);
        let history = desk.history(&desk.room.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].booking_id.as_deref(), Some(booking.id.as_str()));
    }

    #[tokio::test]
    async fn test_confirm_into_dirty_room_fails() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();
        let advance = ledger
            .create_booking(desk.booking(date(11), PaymentSplit::none()))
            .await
            .unwrap();

        desk.clock.set(at(11, 10, 0));
        ledger.check_out(&stay).await.unwrap();

        let err = ledger.confirm_advance_booking(&advance).await.unwrap_err();
        assert!(matches!(err, crate::LedgerError::Core(CoreError::RoomUnavailable { .. })));
        assert_eq!(desk.stored(&advance.id).await.status, BookingStatus::Reserved);
    }

    // -------------------------------------------------------------------------
    // edit
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_edit_recomputes_money() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let booking = ledger
            .create_booking(desk.booking(date(12), PaymentSplit::qr(rupees(300))))
            .await
            .unwrap();

        let edited = ledger
            .update_advance_booking(
                &booking,
                BookingRevision {
                    base_amount: Some(rupees(2000)),
                    check_out_date: Some(date(14)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.total_amount(), rupees(2360));
        assert_eq!(edited.amount_paid(), rupees(300));
        assert_eq!(edited.check_out_date, Some(date(14)));
        assert_balanced(&edited);

        let err = ledger
            .update_advance_booking(
                &edited,
                BookingRevision {
                    payment: Some(PaymentSplit::cash(rupees(3000))),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_edit_moves_room_and_releases_old_one() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let other = add_room(&desk.db, "102").await;
        let booking = ledger
            .create_booking(desk.booking(date(12), PaymentSplit::none()))
            .await
            .unwrap();

        let moved = ledger
            .update_advance_booking(
                &booking,
                BookingRevision {
                    room_id: Some(other.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.room_id, other.id);

        let history = desk.history(&desk.room.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, RoomStatus::Available);
        assert_eq!(history[0].notes.as_deref(), Some("Reservation moved to room 102"));
    }

    #[tokio::test]
    async fn test_edit_keeps_room_held_by_another_reservation() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let other = add_room(&desk.db, "102").await;
        let first = ledger
            .create_booking(desk.booking(date(12), PaymentSplit::none()))
            .await
            .unwrap();
        ledger
            .create_booking(desk.booking(date(14), PaymentSplit::none()))
            .await
            .unwrap();

        ledger
            .update_advance_booking(
                &first,
                BookingRevision {
                    room_id: Some(other.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(desk.history(&desk.room.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_edit_into_room_under_maintenance_fails() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let other = add_room(&desk.db, "102").await;
        desk.db
            .rooms()
            .update(
                &other,
                innkeeper_core::RoomUpdate {
                    status: Some(RoomStatus::Maintenance),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let booking = ledger
            .create_booking(desk.booking(date(12), PaymentSplit::none()))
            .await
            .unwrap();

        let err = ledger
            .update_advance_booking(
                &booking,
                BookingRevision {
                    room_id: Some(other.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateViolation);
        assert_eq!(desk.stored(&booking.id).await.room_id, desk.room.id);
    }

    #[tokio::test]
    async fn test_edit_checked_in_stay_rejected() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::cash(rupees(100))))
            .await
            .unwrap();

        let err = ledger
            .update_advance_booking(
                &stay,
                BookingRevision {
                    base_amount: Some(rupees(5000)),
                    check_out_date: Some(date(15)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateViolation);
        assert!(matches!(err, crate::LedgerError::Core(CoreError::InvalidBookingTransition { .. })));

        let stored = desk.stored(&stay.id).await;
        assert_eq!(stored.status, BookingStatus::CheckedIn);
        assert_eq!(stored.version, stay.version);
        assert_eq!(stored.base_amount(), rupees(1000));
        assert_eq!(stored.check_out_date, Some(date(11)));
        assert_eq!(stored.amount_paid(), rupees(100));
    }

    // -------------------------------------------------------------------------
    // cancel
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_cancel_refunds_paid_minus_charge() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let booking = ledger
            .create_booking(desk.booking(date(12), PaymentSplit::cash(rupees(1000))))
            .await
            .unwrap();

        let cancellation = ledger.cancel_advance_booking(&booking, rupees(300)).await.unwrap();
        assert_eq!(cancellation.refund, rupees(700));
        assert_eq!(cancellation.booking.status, BookingStatus::Cancelled);
        assert_eq!(cancellation.booking.refund_amount(), Some(rupees(700)));
        assert_eq!(cancellation.booking.cancellation_charge(), Some(rupees(300)));
        assert!(cancellation.booking.cancelled_at.is_some());
        assert_balanced(&cancellation.booking);

        let history = desk.history(&desk.room.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].notes.as_deref(), Some("Booking cancelled - room available"));

        // Guest stays on file
        assert!(desk.db.guests().get_by_id(&desk.guest_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancel_charge_above_paid_refunds_nothing() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let booking = ledger
            .create_booking(desk.booking(date(12), PaymentSplit::cash(rupees(1000))))
            .await
            .unwrap();

        let cancellation = ledger.cancel_advance_booking(&booking.id, rupees(1500)).await.unwrap();
        assert_eq!(cancellation.refund, Money::zero());
    }

    #[tokio::test]
    async fn test_cancel_does_not_release_occupied_room() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();
        let advance = ledger
            .create_booking(desk.booking(date(13), PaymentSplit::none()))
            .await
            .unwrap();

        ledger.cancel_advance_booking(&advance, Money::zero()).await.unwrap();
        assert_eq!(desk.room_now().await.status, RoomStatus::Occupied);
        assert_eq!(desk.history(&desk.room.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_checked_in_booking_fails() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();
        let err = ledger.cancel_advance_booking(&stay, Money::zero()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateViolation);
    }

    // -------------------------------------------------------------------------
    // check out / clean
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_check_out_sends_room_to_cleaning() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();

        desk.clock.set(at(11, 11, 59));
        let done = ledger.check_out(&stay).await.unwrap();
        assert_eq!(done.status, BookingStatus::CheckedOut);
        assert_eq!(done.check_out_date, Some(date(11)));
        assert_eq!(done.actual_check_out_time, Some(at(11, 11, 59)));
        assert_eq!(done.nights_billed(), 1);

        assert_eq!(desk.room_now().await.status, RoomStatus::Cleaning);
        let history = desk.history(&desk.room.id).await;
        assert_eq!(history[0].status, RoomStatus::Cleaning);
        assert_eq!(history[0].booking_id.as_deref(), Some(stay.id.as_str()));

        assert_eq!(ledger.check_out(&done).await.unwrap_err().kind(), ErrorKind::StateViolation);
    }

    #[tokio::test]
    async fn test_late_check_out_bills_extra_night() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();

        desk.clock.set(at(11, 12, 0));
        let done = ledger.check_out(&stay).await.unwrap();
        assert_eq!(done.nights_billed(), 2);
    }

    #[tokio::test]
    async fn test_check_out_reserved_booking_fails() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let advance = ledger
            .create_booking(desk.booking(date(12), PaymentSplit::none()))
            .await
            .unwrap();
        let err = ledger.check_out(&advance).await.unwrap_err();
        assert!(matches!(err, crate::LedgerError::Core(CoreError::InvalidBookingTransition { .. })));
    }

    #[tokio::test]
    async fn test_mark_cleaned_stamps_latest_cleaning_entry_only() {
        let desk = desk().await;
        let ledger = desk.db.ledger();

        let first = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();
        desk.clock.set(at(11, 10, 0));
        ledger.check_out(&first).await.unwrap();
        desk.clock.set(at(11, 10, 30));
        ledger.mark_room_cleaned(&desk.room.id).await.unwrap();

        let second = ledger
            .create_booking(desk.booking(date(11), PaymentSplit::none()))
            .await
            .unwrap();
        desk.clock.set(at(12, 9, 0));
        ledger.check_out(&second).await.unwrap();

        desk.clock.set(at(12, 11, 0));
        let room = ledger.mark_room_cleaned(&desk.room.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Available);

        let cleaning: Vec<RoomStatusLog> = desk
            .history(&desk.room.id)
            .await
            .into_iter()
            .filter(|e| e.status == RoomStatus::Cleaning)
            .collect();
        assert_eq!(cleaning.len(), 2);
        assert_eq!(cleaning[0].cleaned_at, Some(at(12, 11, 0).with_timezone(&Utc)));
        assert_eq!(cleaning[1].cleaned_at, Some(at(11, 10, 30).with_timezone(&Utc)));

        // No extra rows: occupied, cleaning, occupied, cleaning
        assert_eq!(desk.history(&desk.room.id).await.len(), 4);
    }

    #[tokio::test]
    async fn test_mark_cleaned_requires_cleaning_status() {
        let desk = desk().await;
        let err = desk.db.ledger().mark_room_cleaned(&desk.room).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateViolation);
    }

    #[tokio::test]
    async fn test_mark_cleaned_without_cleaning_entry() {
        let desk = desk().await;

        // Cleaning status that never went through the ledger
        sqlx::query("UPDATE rooms SET status = 'cleaning' WHERE id = ?1")
            .bind(&desk.room.id)
            .execute(desk.db.pool())
            .await
            .unwrap();

        let room = desk.db.ledger().mark_room_cleaned(&desk.room.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Available);
        assert_eq!(desk.room_now().await.status, RoomStatus::Available);
        assert!(desk.history(&desk.room.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_booking_audit_trail_oldest_first() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();
        let advance = ledger
            .create_booking(desk.booking(date(14), PaymentSplit::none()))
            .await
            .unwrap();

        desk.clock.set(at(11, 10, 0));
        ledger.check_out(&stay).await.unwrap();
        desk.clock.set(at(11, 10, 45));
        ledger.mark_room_cleaned(&desk.room.id).await.unwrap();

        let trail = desk.db.status_log().for_booking(&stay.id).await.unwrap();
        let statuses: Vec<RoomStatus> = trail.iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![RoomStatus::Occupied, RoomStatus::Cleaning]);
        assert!(trail[0].cleaned_at.is_none());
        assert_eq!(trail[1].cleaned_at, Some(at(11, 10, 45).with_timezone(&Utc)));
        assert!(trail.iter().all(|e| e.booking_id.as_deref() == Some(stay.id.as_str())));

        // A reservation that never touched the room has no trail
        assert!(desk.db.status_log().for_booking(&advance.id).await.unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // extend / pay
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_extend_two_days() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::cash(rupees(1180))))
            .await
            .unwrap();

        let outcome = ledger
            .extend_booking(
                &stay,
                Extension {
                    additional_days: 2,
                    daily_rate: rupees(500),
                    gst_rate: GstRate::from_bps(1800),
                    payment: PaymentSplit::qr(rupees(500)),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.charge.base, rupees(1000));
        assert_eq!(outcome.charge.gst, rupees(180));
        assert_eq!(outcome.charge.total, rupees(1180));

        let booking = &outcome.booking;
        assert_eq!(booking.base_amount(), rupees(2000));
        assert_eq!(booking.gst_amount(), rupees(360));
        assert_eq!(booking.total_amount(), rupees(2360));
        assert_eq!(booking.extended_amount(), rupees(1180));
        assert_eq!(booking.check_out_date, Some(date(13)));
        assert_eq!(booking.amount_paid(), rupees(1680));
        assert_eq!(booking.payment_method, PaymentMethod::Mixed);
        assert_balanced(booking);

        assert_eq!(desk.stored(&stay.id).await.total_amount(), rupees(2360));
    }

    #[tokio::test]
    async fn test_extend_open_ended_stay_fails() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let mut input = desk.booking(date(10), PaymentSplit::none());
        input.check_out_date = None;
        let stay = ledger.create_booking(input).await.unwrap();

        let err = ledger
            .extend_booking(
                &stay,
                Extension {
                    additional_days: 1,
                    daily_rate: rupees(500),
                    gst_rate: GstRate::from_bps(1800),
                    payment: PaymentSplit::none(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, crate::LedgerError::Core(CoreError::MissingCheckoutDate(_))));
    }

    #[tokio::test]
    async fn test_overpayment_trimmed_to_balance() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::cash(rupees(680))))
            .await
            .unwrap();
        assert_eq!(stay.outstanding(), rupees(500));

        let paid = ledger
            .update_payment(&stay, PaymentSplit::new(rupees(700), rupees(300)))
            .await
            .unwrap();
        assert_eq!(paid.amount_paid(), paid.total_amount());
        assert_eq!(paid.cash_amount(), rupees(680 + 350));
        assert_eq!(paid.qr_amount(), rupees(150));
        assert_balanced(&paid);

        let err = ledger
            .update_payment(&paid, PaymentSplit::cash(rupees(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::LedgerError::Core(CoreError::NothingOutstanding(_))));
    }

    #[tokio::test]
    async fn test_zero_payment_rejected() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();
        let err = ledger.update_payment(&stay, PaymentSplit::none()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    // -------------------------------------------------------------------------
    // concurrency / atomicity
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_stale_copy_conflicts() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();

        ledger
            .update_payment(&stay, PaymentSplit::cash(rupees(100)))
            .await
            .unwrap();

        // `stay` still carries the version it was created with
        let err = ledger
            .update_payment(&stay, PaymentSplit::cash(rupees(100)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(desk.stored(&stay.id).await.amount_paid(), rupees(100));

        // A bare id skips the check
        ledger
            .update_payment(stay.id.as_str(), PaymentSplit::cash(rupees(100)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_guarded_update_detects_concurrent_write() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();

        let mut stale = stay.clone();
        ledger
            .update_payment(&stay, PaymentSplit::cash(rupees(100)))
            .await
            .unwrap();

        let err = booking::update(desk.db.pool(), &mut stale, Utc::now()).await.unwrap_err();
        assert!(matches!(err, crate::DbError::StaleWrite { .. }));
        assert_eq!(stale.version, stay.version);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_payments_on_file_database() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let root = std::env::temp_dir().join(format!("innkeeper-ledger-{}-{}", std::process::id(), nanos));
        let desk = desk_on(DbConfig::new(root.join("innkeeper.db")).max_connections(4)).await;
        let stay = desk
            .db
            .ledger()
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = desk.db.ledger();
            let id = stay.id.clone();
            handles.push(tokio::spawn(async move {
                ledger.update_payment(id.as_str(), PaymentSplit::cash(rupees(1))).await
            }));
        }

        // Writers queue for the lock; none fails halfway
        let mut applied = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => applied += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict, "{}", err),
            }
        }
        assert_eq!(applied, 8);

        let stored = desk.stored(&stay.id).await;
        assert_eq!(stored.amount_paid(), rupees(applied));
        assert_eq!(stored.version, stay.version + applied);
        assert_balanced(&stored);

        // Two holders of the same version: exactly one wins
        let (ledger_a, ledger_b) = (desk.db.ledger(), desk.db.ledger());
        let (a, b) = tokio::join!(
            ledger_a.update_payment(&stored, PaymentSplit::cash(rupees(1))),
            ledger_b.update_payment(&stored, PaymentSplit::qr(rupees(1))),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = a.err().or(b.err()).unwrap();
        assert_eq!(loser.kind(), ErrorKind::Conflict);
        assert_eq!(desk.stored(&stay.id).await.amount_paid(), rupees(applied + 1));

        desk.db.close().await;
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_failed_check_out_rolls_back_booking() {
        let desk = desk().await;
        let ledger = desk.db.ledger();
        let stay = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::none()))
            .await
            .unwrap();

        // Force the room out of step so the room transition fails after the
        // booking has already been changed in memory.
        sqlx::query("UPDATE rooms SET status = 'maintenance' WHERE id = ?1")
            .bind(&desk.room.id)
            .execute(desk.db.pool())
            .await
            .unwrap();

        let err = ledger.check_out(&stay).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateViolation);

        let stored = desk.stored(&stay.id).await;
        assert_eq!(stored.status, BookingStatus::CheckedIn);
        assert_eq!(stored.version, stay.version);
        assert!(stored.actual_check_out_time.is_none());
        assert_eq!(desk.history(&desk.room.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_money_stays_balanced_through_lifecycle() {
        let desk = desk().await;
        let ledger = desk.db.ledger();

        let advance = ledger
            .create_booking(desk.booking(date(10), PaymentSplit::qr(rupees(250))))
            .await
            .unwrap();
        assert_balanced(&advance);

        let stay = ledger
            .update_payment(&advance, PaymentSplit::new(rupees(333), rupees(1)))
            .await
            .unwrap();
        assert_balanced(&stay);

        let outcome = ledger
            .extend_booking(
                &stay,
                Extension {
                    additional_days: 3,
                    daily_rate: rupees(799),
                    gst_rate: GstRate::from_bps(1200),
                    payment: PaymentSplit::new(rupees(1000), rupees(999)),
                },
            )
            .await
            .unwrap();
        assert_balanced(&outcome.booking);

        let settled = ledger
            .update_payment(&outcome.booking, PaymentSplit::new(rupees(10_000), rupees(10_000)))
            .await
            .unwrap();
        assert_balanced(&settled);
        assert_eq!(settled.outstanding(), Money::zero());

        let done = ledger.check_out(&settled).await.unwrap();
        assert_balanced(&done);
        done.check_invariants().unwrap();
    }
}
