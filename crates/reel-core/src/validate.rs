//! Field validation for entity payloads.
//!
//! The entity store trusts its input; [`Engine`](crate::Engine) runs these
//! checks before handing a payload over.

use chrono::NaiveDate;

use crate::{
  Error, Result,
  entity::{NewFilm, NewReview, NewUser},
};

/// Upper bound on [`NewFilm::description`], in characters.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// The first public film screening; nothing can be released earlier.
pub fn earliest_release_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(1895, 12, 28).unwrap_or(NaiveDate::MIN)
}

pub fn check_user(user: &NewUser, today: NaiveDate) -> Result<()> {
  if user.login.is_empty() {
    return Err(Error::Validation("login must not be empty".into()));
  }
  if user.login.chars().any(char::is_whitespace) {
    return Err(Error::Validation(format!(
      "login {:?} must not contain whitespace",
      user.login
    )));
  }
  let email = user.email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(Error::Validation(format!(
      "email {:?} is not a valid address",
      user.email
    )));
  }
  if user.birthday > today {
    return Err(Error::Validation(format!(
      "birthday {} is in the future",
      user.birthday
    )));
  }
  Ok(())
}

/// The name a user is stored under: the given name, or the login when the
/// name is missing or blank.
pub fn display_name(name: Option<&str>, login: &str) -> String {
  match name.map(str::trim) {
    Some(n) if !n.is_empty() => n.to_owned(),
    _ => login.to_owned(),
  }
}

pub fn check_film(film: &NewFilm) -> Result<()> {
  if film.name.trim().is_empty() {
    return Err(Error::Validation("film name must not be blank".into()));
  }
  let len = film.description.chars().count();
  if len > MAX_DESCRIPTION_LEN {
    return Err(Error::Validation(format!(
      "description is {len} characters; at most {MAX_DESCRIPTION_LEN} allowed"
    )));
  }
  if film.release_date < earliest_release_date() {
    return Err(Error::Validation(format!(
      "release date {} precedes {}",
      film.release_date,
      earliest_release_date()
    )));
  }
  if film.duration == 0 {
    return Err(Error::Validation("duration must be positive".into()));
  }
  Ok(())
}

pub fn check_review_content(content: &str) -> Result<()> {
  if content.trim().is_empty() {
    return Err(Error::Validation("review content must not be blank".into()));
  }
  Ok(())
}

pub fn check_review(review: &NewReview) -> Result<()> {
  check_review_content(&review.content)
}
