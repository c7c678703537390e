use super::Email;
use crate::store::Booking;

/// Render the confirmation sent after a booking, if the patient gave an address.
pub fn booking_confirmation(booking: &Booking) -> Option<Email> {
    let appointment = &booking.appointment;
    let to = appointment.email.clone()?;

    let subject = format!(
        "Appointment #{} confirmed with {}",
        appointment.appointment_number, booking.doctor.name
    );
    let text = format!(
        "Dear {name},\n\n\
         Your appointment is confirmed.\n\n\
         Doctor: {doctor} ({specialization})\n\
         Hospital: {hospital}, {city}\n\
         Date: {date}\n\
         Session starts: {time}\n\
         Appointment number: {number}\n\
         Reference: {id}\n\n\
         Use your phone number to check the running number on the day.\n",
        name = appointment.patient_name,
        doctor = booking.doctor.name,
        specialization = booking.doctor.specialization,
        hospital = booking.hospital.name,
        city = booking.hospital.city,
        date = booking.session.date.format("%Y-%m-%d"),
        time = booking.session.start_time.format("%H:%M"),
        number = appointment.appointment_number,
        id = appointment.id,
    );

    Some(Email { to, subject, text })
}
