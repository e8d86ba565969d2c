//! End-to-end tests of the services over the in-memory store.
//!
//! Covers the payment cascade (payment entry -> invoice -> enrollment ->
//! batch seat count), admission rules, reminders, attendance rosters and the
//! job runner.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use tutorbook_attendance::{AttendanceStatus, MarkAttendance, RosterEntry, UpdateAttendance};
    use tutorbook_catalog::{Batch, Course, CreateCourse, UpdateCourse};
    use tutorbook_core::{PaymentStatus, Record};
    use tutorbook_enrollment::{
        EnrollStudent, EnrollmentStatus, StudentEnrollment, UpdateEnrollment,
    };
    use tutorbook_invoicing::{
        FeeInvoice, InvoiceId, InvoiceStatus, IssueInvoice, PaymentState, RecordPayment,
        UpdateInvoice,
    };
    use tutorbook_students::{RegisterStudent, Student};

    use crate::jobs::{JobRunner, PaymentReminderJob};
    use crate::notify::Communication;
    use crate::services::SEND_PAYMENT_REMINDERS;
    use crate::testkit::{at, batch, course, d, services, services_with_mailer, student};
    use crate::Services;

    fn enroll_at(
        s: &Services,
        day: (i32, u32, u32),
        student: &Student,
        batch: &Batch,
        discount: u64,
    ) -> StudentEnrollment {
        s.enroll(
            &at(day.0, day.1, day.2),
            EnrollStudent {
                student_id: student.id,
                batch_id: batch.id,
                enrollment_date: None,
                discount_amount: discount,
            },
        )
        .unwrap()
    }

    fn invoices_of(s: &Services, e: &StudentEnrollment) -> Vec<FeeInvoice> {
        s.enrollment_invoices(e.id).unwrap()
    }

    fn pay(amount: u64) -> RecordPayment {
        RecordPayment {
            amount,
            posting_date: None,
            mode_of_payment: None,
            reference_no: None,
        }
    }

    fn setup(fee: u64, capacity: Option<u32>) -> (Services, Course, Batch) {
        let s = services();
        let ctx = at(2024, 3, 1);
        let c = course(&s, &ctx, fee);
        let b = batch(&s, &ctx, &c, capacity);
        (s, c, b)
    }

    #[test]
    fn payments_cascade_to_invoice_and_enrollment() {
        let (s, _c, b) = setup(3_000_000, Some(10));
        let an = student(&s, &at(2024, 3, 1), "An", Some("an@example.com"));
        let e = enroll_at(&s, (2024, 3, 5), &an, &b, 500_000);

        assert_eq!(e.total_fee, 2_500_000);
        assert_eq!(e.payment_status, PaymentStatus::Unpaid);
        assert_eq!(s.get_batch(b.id).unwrap().current_enrollment, 1);

        let invoices = invoices_of(&s, &e);
        assert_eq!(invoices.len(), 1);
        let invoice = &invoices[0];
        assert_eq!(invoice.total_amount, 2_500_000);
        assert_eq!(invoice.due_date, d(2024, 3, 5));
        assert_eq!(invoice.status, InvoiceStatus::Submitted);
        assert_eq!(invoice.student_name, "An Nguyen");

        let receipt = s.apply_payment(&at(2024, 3, 5), invoice.id, pay(1_000_000)).unwrap();
        assert_eq!(receipt.payment_entry.state, PaymentState::Submitted);
        assert_eq!(receipt.payment_entry.mode_of_payment, None);
        assert_eq!(receipt.invoice.payment_status, PaymentStatus::PartiallyPaid);
        assert_eq!(receipt.invoice.outstanding_amount, 1_500_000);
        let partial = s.get_enrollment(e.id).unwrap();
        assert_eq!(partial.paid_amount, 1_000_000);
        assert_eq!(partial.payment_status, PaymentStatus::PartiallyPaid);

        let receipt = s.apply_payment(&at(2024, 3, 10), invoice.id, pay(1_500_000)).unwrap();
        assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
        let paid = s.get_enrollment(e.id).unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.outstanding_amount, 0);
        assert_eq!(paid.last_payment_date, Some(d(2024, 3, 10)));

        let history = s.enrollment_payment_history(e.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].posting_date, d(2024, 3, 10));
        assert_eq!(s.invoice_payment_history(invoice.id).unwrap().len(), 2);
    }

    #[test]
    fn rerunning_the_cascade_changes_nothing() {
        let (s, _c, b) = setup(1_200_000, None);
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        let e = enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let invoice = invoices_of(&s, &e).remove(0);
        s.apply_payment(&ctx, invoice.id, pay(700_000)).unwrap();

        let first = s.update_invoice_payment_status(&ctx, invoice.id).unwrap();
        let second = s.update_invoice_payment_status(&ctx, invoice.id).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.paid_amount, 700_000);

        let before = s.get_enrollment(e.id).unwrap();
        let again = s.update_enrollment_payment_status(&ctx, e.id).unwrap();
        assert_eq!(again.paid_amount, before.paid_amount);
        assert_eq!(again.outstanding_amount, 500_000);
        assert_eq!(s.get_enrollment(e.id).unwrap(), before);
    }

    #[test]
    fn full_batch_rejects_new_seat_but_allows_resave() {
        let (s, _c, b) = setup(1_000_000, Some(1));
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        let binh = student(&s, &ctx, "Binh", None);
        let first = enroll_at(&s, (2024, 3, 1), &an, &b, 0);

        let err = s
            .enroll(
                &ctx,
                EnrollStudent {
                    student_id: binh.id,
                    batch_id: b.id,
                    enrollment_date: None,
                    discount_amount: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("batch is full"));
        assert!(s.is_batch_full(b.id).unwrap());
        assert_eq!(s.available_slots(b.id).unwrap(), Some(0));

        let resaved = s
            .update_enrollment(
                &ctx,
                first.id,
                UpdateEnrollment {
                    discount_amount: Some(100_000),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(resaved.total_fee, 900_000);
        assert_eq!(s.get_batch(b.id).unwrap().current_enrollment, 1);

        s.update_enrollment(
            &ctx,
            first.id,
            UpdateEnrollment {
                status: Some(EnrollmentStatus::Cancelled),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(s.get_batch(b.id).unwrap().current_enrollment, 0);
        enroll_at(&s, (2024, 3, 2), &binh, &b, 0);
        assert_eq!(s.get_batch(b.id).unwrap().current_enrollment, 1);
    }

    #[test]
    fn duplicate_active_enrollment_is_rejected() {
        let (s, _c, b) = setup(1_000_000, None);
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        let first = enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let cmd = EnrollStudent {
            student_id: an.id,
            batch_id: b.id,
            enrollment_date: None,
            discount_amount: 0,
        };

        let err = s.enroll(&ctx, cmd.clone()).unwrap_err();
        assert!(err.to_string().contains("already enrolled"));

        s.update_enrollment(
            &ctx,
            first.id,
            UpdateEnrollment {
                status: Some(EnrollmentStatus::Dropped),
                ..Default::default()
            },
        )
        .unwrap();
        s.enroll(&ctx, cmd).unwrap();

        let err = s
            .update_enrollment(
                &ctx,
                first.id,
                UpdateEnrollment {
                    status: Some(EnrollmentStatus::Active),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(s.get_batch(b.id).unwrap().current_enrollment, 1);
    }

    #[test]
    fn moving_an_enrollment_recounts_both_batches() {
        let (s, c, from) = setup(1_000_000, None);
        let ctx = at(2024, 3, 1);
        let to = batch(&s, &ctx, &c, Some(5));
        let an = student(&s, &ctx, "An", None);
        let e = enroll_at(&s, (2024, 3, 1), &an, &from, 0);

        let moved = s
            .update_enrollment(
                &ctx,
                e.id,
                UpdateEnrollment {
                    batch_id: Some(to.id),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(moved.batch_id, to.id);
        assert_eq!(s.get_batch(from.id).unwrap().current_enrollment, 0);
        assert_eq!(s.get_batch(to.id).unwrap().current_enrollment, 1);
        assert_eq!(s.batch_enrollments(to.id).unwrap().len(), 1);
        assert_eq!(invoices_of(&s, &moved).len(), 1);
    }

    #[test]
    fn fully_discounted_enrollment_gets_no_invoice() {
        let (s, _c, b) = setup(800_000, None);
        let an = student(&s, &at(2024, 3, 1), "An", None);
        let e = enroll_at(&s, (2024, 3, 1), &an, &b, 800_000);
        assert_eq!(e.total_fee, 0);
        assert!(invoices_of(&s, &e).is_empty());

        let ctx = at(2024, 3, 1);
        let invoice = s
            .create_invoice(
                &ctx,
                IssueInvoice {
                    enrollment_id: e.id,
                    invoice_date: None,
                    due_date: Some(d(2024, 3, 31)),
                    course_fee: 0,
                    discount_amount: 0,
                },
            )
            .unwrap();
        assert_eq!(invoice.total_amount, 0);
        assert_eq!(invoice.outstanding_amount, 0);

        let err = s.mark_as_paid(&ctx, invoice.id).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("no outstanding balance"), "{err}");
        assert!(s.invoice_payment_history(invoice.id).unwrap().is_empty());
    }

    #[test]
    fn oversized_discount_writes_nothing() {
        let (s, _c, b) = setup(800_000, None);
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        let err = s
            .enroll(
                &ctx,
                EnrollStudent {
                    student_id: an.id,
                    batch_id: b.id,
                    enrollment_date: None,
                    discount_amount: 900_000,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(s.store().enrollments.list().unwrap().is_empty());
        assert_eq!(s.get_batch(b.id).unwrap().current_enrollment, 0);
    }

    #[test]
    fn cancelled_invoice_stops_counting_and_rejects_payments() {
        let (s, _c, b) = setup(1_000_000, None);
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        let e = enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let invoice = invoices_of(&s, &e).remove(0);
        s.apply_payment(&ctx, invoice.id, pay(400_000)).unwrap();
        assert_eq!(s.get_enrollment(e.id).unwrap().paid_amount, 400_000);

        let cancelled = s.cancel_invoice(&ctx, invoice.id).unwrap();
        assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
        let e = s.get_enrollment(e.id).unwrap();
        assert_eq!(e.paid_amount, 0);
        assert_eq!(e.payment_status, PaymentStatus::Unpaid);

        let err = s.apply_payment(&ctx, invoice.id, pay(100)).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(s.cancel_invoice(&ctx, invoice.id).unwrap_err().kind(), "conflict");
        let err = s
            .update_invoice(
                &ctx,
                invoice.id,
                UpdateInvoice {
                    due_date: Some(d(2024, 4, 1)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn mark_as_paid_stays_reconstructible() {
        let (s, _c, b) = setup(1_500_000, None);
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        let e = enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let invoice = invoices_of(&s, &e).remove(0);

        let receipt = s.mark_as_paid(&ctx, invoice.id).unwrap();
        assert_eq!(receipt.payment_entry.reference_no.as_deref(), Some("manual"));
        assert_eq!(receipt.payment_entry.paid_amount, 1_500_000);
        assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);

        let rebuilt = s.update_invoice_payment_status(&ctx, invoice.id).unwrap();
        assert_eq!(rebuilt.payment_status, PaymentStatus::Paid);
        assert_eq!(s.get_enrollment(e.id).unwrap().payment_status, PaymentStatus::Paid);

        let err = s.mark_as_paid(&ctx, invoice.id).unwrap_err();
        assert!(err.to_string().contains("already marked as paid"));
    }

    #[test]
    fn payment_defaults_and_rejections() {
        let (s, _c, b) = setup(1_000_000, None);
        let ctx = at(2024, 3, 1);
        s.create_mode_of_payment(&ctx, "Cash", true).unwrap();
        s.create_mode_of_payment(&ctx, "Bank Transfer", true).unwrap();
        s.create_mode_of_payment(&ctx, "Alipay", false).unwrap();
        assert_eq!(s.create_mode_of_payment(&ctx, "Cash", true).unwrap_err().kind(), "validation");

        let an = student(&s, &ctx, "An", None);
        let e = enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let invoice = invoices_of(&s, &e).remove(0);

        let receipt = s.apply_payment(&ctx, invoice.id, pay(100_000)).unwrap();
        assert_eq!(receipt.payment_entry.mode_of_payment.as_deref(), Some("Bank Transfer"));
        assert_eq!(receipt.payment_entry.posting_date, d(2024, 3, 1));

        let explicit = RecordPayment {
            mode_of_payment: Some("Cash".to_string()),
            ..pay(100_000)
        };
        let receipt = s.apply_payment(&ctx, invoice.id, explicit).unwrap();
        assert_eq!(receipt.payment_entry.mode_of_payment.as_deref(), Some("Cash"));

        assert_eq!(s.apply_payment(&ctx, invoice.id, pay(0)).unwrap_err().kind(), "validation");
        let err = s.apply_payment(&ctx, InvoiceId::generate(), pay(10)).unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.to_string(), "fee invoice not found");
    }

    #[test]
    fn invoice_edits_keep_explicit_fees_and_validate_dates() {
        let (s, _c, b) = setup(1_000_000, None);
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        let e = enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let invoice = invoices_of(&s, &e).remove(0);

        let edited = s
            .update_invoice(
                &ctx,
                invoice.id,
                UpdateInvoice {
                    course_fee: Some(1_200_000),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(edited.course_fee, 1_200_000);
        assert_eq!(edited.total_amount, 1_200_000);

        let err = s
            .update_invoice(
                &ctx,
                invoice.id,
                UpdateInvoice {
                    due_date: Some(d(2024, 2, 1)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn reminders_refresh_overdue_skip_and_dedup() {
        let (s, mailer) = services_with_mailer();
        let ctx = at(2024, 3, 1);
        let c = course(&s, &ctx, 1_000_000);
        let b = batch(&s, &ctx, &c, None);
        let roster = [
            ("An", Some("an@example.com")),
            ("Binh", None),
            ("Chi", Some("chi@example.com")),
        ];
        for (name, email) in roster {
            let st = student(&s, &ctx, name, email);
            enroll_at(&s, (2024, 3, 1), &st, &b, 0);
        }

        let run = s.send_payment_reminders(&ctx).unwrap();
        assert_eq!(run.marked_overdue, 0);
        assert_eq!(run.reminders_sent, 0);

        let run = s.send_payment_reminders(&at(2024, 3, 5)).unwrap();
        assert_eq!(run.marked_overdue, 3);
        assert_eq!(run.reminders_sent, 2);
        assert_eq!(run.skipped_no_email, 1);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent
            .iter()
            .all(|m| m.subject.contains("Payment Reminder") && m.sender == "Administrator"));
        assert_eq!(s.store().communications.list().unwrap().len(), 2);

        let run = s.send_payment_reminders(&at(2024, 3, 5)).unwrap();
        assert_eq!(run.reminders_sent, 0);
        assert_eq!(run.skipped_already_reminded, 2);

        let run = s.send_payment_reminders(&at(2024, 3, 6)).unwrap();
        assert_eq!(run.reminders_sent, 2);
        assert_eq!(mailer.sent().len(), 4);
    }

    #[test]
    fn failed_reminder_leaves_no_communication_and_paid_invoices_are_skipped() {
        let (s, mailer) = services_with_mailer();
        let ctx = at(2024, 3, 1);
        let c = course(&s, &ctx, 1_000_000);
        let b = batch(&s, &ctx, &c, None);
        let an = student(&s, &ctx, "An", Some("an@example.com"));
        let chi = student(&s, &ctx, "Chi", Some("chi@example.com"));
        let dung = student(&s, &ctx, "Dung", Some("dung@example.com"));
        enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        enroll_at(&s, (2024, 3, 1), &chi, &b, 0);
        let settled = enroll_at(&s, (2024, 3, 1), &dung, &b, 0);
        s.mark_as_paid(&ctx, invoices_of(&s, &settled).remove(0).id).unwrap();
        mailer.fail_for("chi@example.com");

        let run = s.send_payment_reminders(&at(2024, 3, 5)).unwrap();
        assert_eq!(run.reminders_sent, 1);
        assert_eq!(run.failed, 1);
        let recorded = s.store().communications.list().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].recipients, "an@example.com");
    }

    #[test]
    fn manual_reminder_is_sent_as_the_caller() {
        let (s, mailer) = services_with_mailer();
        let ctx = at(2024, 3, 1);
        let c = course(&s, &ctx, 1_000_000);
        let b = batch(&s, &ctx, &c, None);
        let an = student(&s, &ctx, "An", Some("an@example.com"));
        let binh = student(&s, &ctx, "Binh", None);
        let with_email = enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let without = enroll_at(&s, (2024, 3, 1), &binh, &b, 0);

        let invoice = invoices_of(&s, &with_email).remove(0);
        let sent: Communication = s.send_reminder(&ctx, invoice.id).unwrap();
        assert_eq!(sent.sender, "staff@center.test");
        assert_eq!(sent.reference_invoice, Some(invoice.id));
        assert_eq!(mailer.sent().len(), 1);

        let err = s
            .send_reminder(&ctx, invoices_of(&s, &without).remove(0).id)
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("student email not found"));
    }

    #[test]
    fn attendance_marks_and_rosters() {
        let (s, _c, b) = setup(1_000_000, None);
        let ctx = at(2024, 4, 13);
        let an = student(&s, &ctx, "An", None);
        let binh = student(&s, &ctx, "Binh", None);
        let chi = student(&s, &ctx, "Chi", None);
        let cmd = MarkAttendance {
            student_id: an.id,
            batch_id: b.id,
            attendance_date: d(2024, 4, 13),
            status: AttendanceStatus::Present,
            notes: String::new(),
            class_time: None,
        };

        let mark = s.mark_attendance(&ctx, cmd.clone()).unwrap();
        assert_eq!(mark.class_time.as_deref(), Some("Mon 18:00"));
        assert_eq!(mark.student_name, "An Nguyen");
        assert_eq!(s.mark_attendance(&ctx, cmd.clone()).unwrap_err().kind(), "validation");
        let future = MarkAttendance {
            attendance_date: d(2024, 4, 14),
            ..cmd
        };
        assert_eq!(s.mark_attendance(&ctx, future).unwrap_err().kind(), "validation");

        let entry = |student: &Student, status| RosterEntry {
            student: student.id,
            status,
            notes: String::new(),
        };
        let first = s
            .mark_batch_attendance(
                &ctx,
                b.id,
                d(2024, 4, 12),
                vec![entry(&an, AttendanceStatus::Present), entry(&binh, AttendanceStatus::Absent)],
            )
            .unwrap();
        assert_eq!((first.created, first.updated, first.total), (2, 0, 2));

        let second = s
            .mark_batch_attendance(
                &ctx,
                b.id,
                d(2024, 4, 12),
                vec![
                    entry(&an, AttendanceStatus::Late),
                    entry(&binh, AttendanceStatus::Absent),
                    entry(&chi, AttendanceStatus::Present),
                ],
            )
            .unwrap();
        assert_eq!((second.created, second.updated, second.total), (1, 2, 3));

        let summary = s.attendance_summary(an.id, b.id).unwrap();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.attended_sessions, 1);
        assert_eq!(summary.late_sessions, 1);
        assert_eq!(summary.attendance_rate, 50.0);
        assert_eq!(s.batch_attendance_summary(b.id).unwrap().total_sessions, 4);

        let err = s
            .mark_batch_attendance(
                &ctx,
                b.id,
                d(2024, 4, 14),
                vec![entry(&an, AttendanceStatus::Present)],
            )
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        let stranger = Student::register(
            &RegisterStudent {
                first_name: "Ghost".into(),
                last_name: "Student".into(),
                ..Default::default()
            },
            "STU999999".into(),
            ctx.now(),
        )
        .unwrap();
        let err = s
            .mark_batch_attendance(
                &ctx,
                b.id,
                d(2024, 4, 10),
                vec![
                    entry(&an, AttendanceStatus::Present),
                    entry(&stranger, AttendanceStatus::Present),
                ],
            )
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(s.store().attendance.list().unwrap().len(), 4);

        let updated = s
            .update_attendance(
                &ctx,
                mark.id,
                UpdateAttendance {
                    status: Some(AttendanceStatus::Excused),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, AttendanceStatus::Excused);
    }

    #[test]
    fn enrollment_attendance_summary_covers_its_batch_only() {
        let (s, c, b) = setup(1_000_000, None);
        let ctx = at(2024, 4, 13);
        let other = batch(&s, &ctx, &c, None);
        let an = student(&s, &ctx, "An", None);
        let e = enroll_at(&s, (2024, 4, 1), &an, &b, 0);
        let marks = [
            (b.id, AttendanceStatus::Present),
            (other.id, AttendanceStatus::Absent),
        ];
        for (batch_id, status) in marks {
            s.mark_attendance(
                &ctx,
                MarkAttendance {
                    student_id: an.id,
                    batch_id,
                    attendance_date: d(2024, 4, 13),
                    status,
                    notes: String::new(),
                    class_time: None,
                },
            )
            .unwrap();
        }
        let summary = s.enrollment_attendance_summary(e.id).unwrap();
        assert_eq!(summary.total_sessions, 1);
        assert_eq!(summary.attendance_rate, 100.0);
    }

    #[test]
    fn codes_are_generated_and_explicit_ones_must_be_unique() {
        let s = services();
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        assert!(an.student_code.starts_with("STU"));
        assert_eq!(an.student_code.len(), 9);
        assert!(an.student_code[3..].chars().all(|ch| ch.is_ascii_digit()));

        let explicit = RegisterStudent {
            first_name: "Binh".into(),
            last_name: "Tran".into(),
            student_code: Some("STU000001".into()),
            ..Default::default()
        };
        s.register_student(&ctx, explicit.clone()).unwrap();
        assert_eq!(s.register_student(&ctx, explicit).unwrap_err().kind(), "validation");

        let unnamed = s
            .create_course(
                &ctx,
                CreateCourse {
                    course_fee: 1_000,
                    duration_months: 1,
                    sessions_per_week: 1,
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(unnamed.course_code.starts_with("CRS"));
        assert_eq!(unnamed.course_code.len(), 7);
        assert_eq!(unnamed.course_name, format!("Course {}", unnamed.course_code));
    }

    #[test]
    fn student_and_course_lookups() {
        let (s, c, b) = setup(2_000_000, None);
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let later = enroll_at(&s, (2024, 3, 9), &an, &batch(&s, &ctx, &c, None), 0);

        let mine = s.student_enrollments(an.id).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, later.id);
        assert_eq!(s.course_enrollments(c.id).unwrap().len(), 2);
        assert_eq!(s.course_total_enrollments(c.id).unwrap(), 2);
        assert_eq!(s.course_revenue(c.id).unwrap(), 0);

        s.mark_as_paid(&ctx, invoices_of(&s, &later).remove(0).id).unwrap();
        assert_eq!(s.course_revenue(c.id).unwrap(), 2_000_000);
    }

    #[test]
    fn renaming_a_course_renames_it_on_its_batches() {
        let (s, c, b) = setup(2_000_000, None);
        let ctx = at(2024, 3, 1);
        let renamed = s
            .update_course(
                &ctx,
                c.id,
                UpdateCourse {
                    course_name: Some("IELTS Intensive".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.course_name, "IELTS Intensive");
        assert_eq!(s.get_batch(b.id).unwrap().course_name, "IELTS Intensive");

        let fee_only = s
            .update_course(
                &ctx,
                c.id,
                UpdateCourse {
                    course_fee: Some(2_500_000),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(fee_only.course_fee, 2_500_000);
        assert_eq!(s.get_batch(b.id).unwrap().version(), 2);
    }

    #[test]
    fn concurrent_enrollments_never_overfill_a_batch() {
        let (s, _c, b) = setup(1_000_000, Some(3));
        let s = Arc::new(s);
        let ctx = at(2024, 3, 1);
        let students: Vec<_> = (0..8).map(|i| student(&s, &ctx, &format!("S{i}"), None)).collect();

        let handles: Vec<_> = students
            .into_iter()
            .map(|st| {
                let s = Arc::clone(&s);
                let batch_id = b.id;
                thread::spawn(move || {
                    s.enroll(
                        &at(2024, 3, 1),
                        EnrollStudent {
                            student_id: st.id,
                            batch_id,
                            enrollment_date: None,
                            discount_amount: 0,
                        },
                    )
                    .is_ok()
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 3);
        assert_eq!(s.get_batch(b.id).unwrap().current_enrollment, 3);
    }

    #[test]
    fn concurrent_payments_on_one_invoice_all_count() {
        let (s, _c, b) = setup(10_000_000, None);
        let ctx = at(2024, 3, 1);
        let an = student(&s, &ctx, "An", None);
        let e = enroll_at(&s, (2024, 3, 1), &an, &b, 0);
        let invoice = invoices_of(&s, &e).remove(0);
        let s = Arc::new(s);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let s = Arc::clone(&s);
                let invoice_id = invoice.id;
                thread::spawn(move || {
                    s.apply_payment(&at(2024, 3, 2), invoice_id, pay(100_000))
                        .is_ok()
                })
            })
            .collect();
        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count();
        assert_eq!(succeeded, 16);

        let history = s.invoice_payment_history(invoice.id).unwrap();
        assert_eq!(history.len(), 16);
        let stored = s.get_invoice(invoice.id).unwrap();
        assert_eq!(stored.paid_amount, 1_600_000);
        assert_eq!(stored.outstanding_amount, 8_400_000);
        let enrollment = s.get_enrollment(e.id).unwrap();
        assert_eq!(enrollment.paid_amount, 1_600_000);
        assert_eq!(enrollment.payment_status, PaymentStatus::PartiallyPaid);
    }

    #[test]
    fn reminder_job_runs_through_the_runner() {
        let (s, _mailer) = services_with_mailer();
        let ctx = at(2024, 3, 1);
        let c = course(&s, &ctx, 1_000_000);
        let b = batch(&s, &ctx, &c, None);
        let an = student(&s, &ctx, "An", Some("an@example.com"));
        enroll_at(&s, (2024, 3, 1), &an, &b, 0);

        let s = Arc::new(s);
        let runner = JobRunner::new().register(Arc::new(PaymentReminderJob::new(Arc::clone(&s))));
        assert_eq!(runner.job_names(), vec![SEND_PAYMENT_REMINDERS]);
        let run = runner.trigger(SEND_PAYMENT_REMINDERS, at(2024, 3, 8).now()).unwrap();
        assert!(run.status.is_success());
        assert_eq!(run.summary["reminders_sent"], 1);
        assert_eq!(run.summary["marked_overdue"], 1);
    }
}
