//! Human-readable formatting of the per-post metadata shown on index tiles.

use chrono::NaiveDate;

/// Formats the metadata line of a tile. [`crate::tile::PostListRenderer`] is
/// generic over this so sites can swap in their own wording.
pub trait Format {
    /// Formats a post's publish date.
    fn date(&self, date: NaiveDate) -> String;

    /// Formats a reading time given in (fractional) minutes.
    fn reading_time(&self, minutes: f64) -> String;

    /// Formats a photo count. Returns `None` when there is nothing worth
    /// displaying (i.e., no photos).
    fn photo_count(&self, count: usize) -> Option<String>;
}

/// The default, English-language [`Format`], e.g. `January 01, 2021 • 5 min
/// read • 3 photos`.
#[derive(Clone, Copy, Debug, Default)]
pub struct English;

impl Format for English {
    fn date(&self, date: NaiveDate) -> String {
        date.format("%B %d, %Y").to_string()
    }

    fn reading_time(&self, minutes: f64) -> String {
        // Anything shorter than a minute still reads as "1 min read". NaN
        // falls through `max` as 1 as well.
        let minutes = minutes.ceil().max(1.0) as u64;
        format!("{} min read", minutes)
    }

    fn photo_count(&self, count: usize) -> Option<String> {
        match count {
            0 => None,
            1 => Some(String::from("1 photo")),
            n => Some(format!("{} photos", n)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_date() {
        let date = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
        assert_eq!("February 01, 2021", English.date(date));
    }

    #[test]
    fn test_reading_time() {
        assert_eq!("1 min read", English.reading_time(0.0));
        assert_eq!("1 min read", English.reading_time(0.2));
        assert_eq!("5 min read", English.reading_time(5.0));
        assert_eq!("11 min read", English.reading_time(10.01));
    }

    #[test]
    fn test_photo_count() {
        assert_eq!(None, English.photo_count(0));
        assert_eq!(Some(String::from("1 photo")), English.photo_count(1));
        assert_eq!(Some(String::from("3 photos")), English.photo_count(3));
    }
}
