use bson::Bson;
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    Boolean,
    /// ISO `YYYY-MM-DD`, stored as text so it orders chronologically.
    Date,
}

impl ColumnKind {
    /// Normalizes a written value to this column's storage representation.
    ///
    /// # Errors
    /// A short reason when the value cannot be stored in the column.
    pub fn coerce(self, value: &Bson) -> Result<Bson, String> {
        match (self, value) {
            (Self::Integer, Bson::Int32(i)) => Ok(Bson::Int64(i64::from(*i))),
            (Self::Integer, Bson::Int64(i)) => Ok(Bson::Int64(*i)),
            #[allow(clippy::cast_possible_truncation)]
            (Self::Integer, Bson::Double(f)) if f.fract() == 0.0 && f.is_finite() => {
                Ok(Bson::Int64(*f as i64))
            }
            (Self::Real, Bson::Double(f)) => Ok(Bson::Double(*f)),
            #[allow(clippy::cast_precision_loss)]
            (Self::Real, Bson::Int32(i)) => Ok(Bson::Double(f64::from(*i))),
            #[allow(clippy::cast_precision_loss)]
            (Self::Real, Bson::Int64(i)) => Ok(Bson::Double(*i as f64)),
            (Self::Text, Bson::String(s)) => Ok(Bson::String(s.clone())),
            (Self::Boolean, Bson::Boolean(b)) => Ok(Bson::Boolean(*b)),
            (Self::Date, Bson::String(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(|d| Bson::String(d.format(DATE_FORMAT).to_string()))
                .map_err(|e| format!("expected date YYYY-MM-DD: {e}")),
            (kind, other) => Err(format!("expected {kind:?}, got {:?}", other.element_type())),
        }
    }

    /// Binds a textual filter literal to this column's type, the way a SQL
    /// driver binds a string parameter. `None` means no row can match it.
    #[must_use]
    pub fn parse_literal(self, literal: &str) -> Option<Bson> {
        match self {
            Self::Integer => literal.trim().parse::<i64>().ok().map(Bson::Int64),
            Self::Real => literal.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(Bson::Double),
            Self::Text => Some(Bson::String(literal.to_string())),
            Self::Boolean => match literal.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Bson::Boolean(true)),
                "false" | "0" => Some(Bson::Boolean(false)),
                _ => None,
            },
            Self::Date => NaiveDate::parse_from_str(literal.trim(), DATE_FORMAT)
                .ok()
                .map(|d| Bson::String(d.format(DATE_FORMAT).to_string())),
        }
    }

    /// Textual rendering used by LIKE matching. NULL renders to nothing.
    #[must_use]
    pub fn render(self, value: &Bson) -> Option<String> {
        match value {
            Bson::Null => None,
            Bson::String(s) => Some(s.clone()),
            Bson::Int32(i) => Some(i.to_string()),
            Bson::Int64(i) => Some(i.to_string()),
            Bson::Double(f) if f.fract() == 0.0 && f.is_finite() => Some(format!("{f:.1}")),
            Bson::Double(f) => Some(f.to_string()),
            Bson::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl Column {
    #[must_use]
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind, nullable: false }
    }

    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    #[must_use]
    pub const fn real(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Real)
    }

    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    #[must_use]
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    #[must_use]
    pub const fn date(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Date)
    }

    #[must_use]
    pub const fn nullable(self) -> Self {
        Self { nullable: true, ..self }
    }
}

/// Table definition: columns, primary key and extra unique constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub primary_key: &'static [&'static str],
    pub unique: &'static [&'static [&'static str]],
}

impl TableSpec {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key first, then the extra constraints.
    pub fn constraints(&self) -> impl Iterator<Item = &'static [&'static str]> + '_ {
        std::iter::once(self.primary_key).chain(self.unique.iter().copied())
    }
}
