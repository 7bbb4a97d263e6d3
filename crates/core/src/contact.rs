//! Deep links for contacting the shop.

/// `WhatsApp` click-to-chat link with a prefilled message.
///
/// Everything but digits is stripped from `number`, so `+55 (11) 99999-0000`
/// works as configured.
#[must_use]
pub fn whatsapp_link(number: &str, message: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(message)
    )
}

/// Google Maps search link for an address.
#[must_use]
pub fn maps_link(address: &str) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        urlencoding::encode(address)
    )
}

/// Prefilled `WhatsApp` message sent after a booking.
#[must_use]
pub fn booking_message(pet_name: &str, date: &str, time: &str) -> String {
    format!("Olá! Acabei de agendar um horário para {pet_name} em {date} às {time}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_link_strips_formatting() {
        assert_eq!(
            whatsapp_link("+55 (11) 99999-0000", "Oi, tudo bem?"),
            "https://wa.me/5511999990000?text=Oi%2C%20tudo%20bem%3F"
        );
    }

    #[test]
    fn test_maps_link_encodes_address() {
        assert_eq!(
            maps_link("Av. Paulista, 1000"),
            "https://www.google.com/maps/search/?api=1&query=Av.%20Paulista%2C%201000"
        );
    }

    #[test]
    fn test_booking_message() {
        assert_eq!(
            booking_message("Rex", "21/10/2026", "14:00"),
            "Olá! Acabei de agendar um horário para Rex em 21/10/2026 às 14:00."
        );
    }
}
