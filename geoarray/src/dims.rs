//! Dimension roles and their inference from dimension names.

use std::collections::BTreeMap;

use derive_more::derive::Display;
use thiserror::Error;

/// Dimension names recognised as the y (row) dimension.
pub const Y_DIM_NAMES: &[&str] = &["y", "lat", "lats", "latitude", "row", "rows"];

/// Dimension names recognised as the x (column) dimension.
pub const X_DIM_NAMES: &[&str] = &[
    "x", "lon", "lons", "long", "longitude", "col", "cols", "column", "columns",
];

/// Dimension names recognised as the vertical dimension.
pub const VERTICAL_DIM_NAMES: &[&str] = &[
    "z",
    "vertical",
    "pressure",
    "pressure_level",
    "lev",
    "level",
    "altitude",
    "height",
    "depth",
];

/// Dimension names recognised as the time dimension.
pub const TIME_DIM_NAMES: &[&str] = &["time", "t"];

/// The role a dimension plays in a gridded product.
///
/// The [`Display`] form of a role is its preferred dimension name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum DimRole {
    /// The horizontal x (column) dimension.
    #[display("x")]
    X,
    /// The horizontal y (row) dimension.
    #[display("y")]
    Y,
    /// The vertical dimension.
    #[display("vertical")]
    Vertical,
    /// The temporal dimension.
    #[display("time")]
    Time,
}

impl DimRole {
    /// All roles.
    pub const ALL: [Self; 4] = [Self::X, Self::Y, Self::Vertical, Self::Time];

    /// The dimension names recognised for the role, all lower case.
    #[must_use]
    pub const fn recognised_names(self) -> &'static [&'static str] {
        match self {
            Self::X => X_DIM_NAMES,
            Self::Y => Y_DIM_NAMES,
            Self::Vertical => VERTICAL_DIM_NAMES,
            Self::Time => TIME_DIM_NAMES,
        }
    }
}

/// The error raised for an unrecognised dimension role string.
#[derive(Debug, Error)]
#[error("unrecognised dimension role {_0:?}, expected \"x\", \"y\", \"vertical\", or \"time\"")]
pub struct DimRoleParseError(String);

impl core::str::FromStr for DimRole {
    type Err = DimRoleParseError;

    fn from_str(role: &str) -> Result<Self, Self::Err> {
        match role.to_ascii_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "vertical" | "z" => Ok(Self::Vertical),
            "time" | "t" => Ok(Self::Time),
            _ => Err(DimRoleParseError(role.to_string())),
        }
    }
}

/// The error raised when assigning a role to a dimension the object does
/// not have.
#[derive(Debug, Error)]
#[error("{name:?} is not a dimension of this object (dimensions: {dims:?})")]
pub struct UnknownDimensionError {
    name: String,
    dims: Vec<String>,
}

impl UnknownDimensionError {
    pub(crate) fn new(name: impl Into<String>, dims: Vec<String>) -> Self {
        Self {
            name: name.into(),
            dims,
        }
    }
}

/// The error raised when renaming a dimension to its preferred role name
/// would collide with an existing dimension or coordinate of the object.
#[derive(Debug, Error)]
pub enum RenameCollisionError {
    /// The rename target is already a dimension of the object.
    #[error("cannot rename dimension {from:?} to {to:?}, the object already has a dimension {to:?}")]
    Dimension {
        /// The dimension being renamed.
        from: String,
        /// The colliding rename target.
        to: String,
    },
    /// The rename target is already a coordinate of the object.
    #[error("cannot rename dimension {from:?} to {to:?}, the object already has a coordinate {to:?}")]
    Coordinate {
        /// The dimension being renamed.
        from: String,
        /// The colliding rename target.
        to: String,
    },
}

/// A mapping from dimension roles to the actual dimension names of an
/// object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DimMap {
    roles: BTreeMap<DimRole, String>,
}

impl DimMap {
    /// Infer dimension roles from dimension names.
    ///
    /// Each dimension is matched case insensitively against the recognised
    /// name tables, in dimension order. A dimension claims at most one role
    /// and a role at most one dimension, so `["lat", "latitude"]` assigns y
    /// to `"lat"` and leaves `"latitude"` unassigned.
    ///
    /// A two dimensional object where no name matched any table falls back to
    /// positional assignment: the first dimension is y and the second x.
    /// Objects of any other dimensionality, or with any matched name, get no
    /// such fallback.
    #[must_use]
    pub fn infer(dims: &[String]) -> Self {
        let mut map = Self::default();
        for dim in dims {
            let lower = dim.to_ascii_lowercase();
            for role in DimRole::ALL {
                if map.roles.contains_key(&role) {
                    continue;
                }
                if role.recognised_names().contains(&lower.as_str()) {
                    map.roles.insert(role, dim.clone());
                    break;
                }
            }
        }
        if dims.len() == 2 && map.roles.is_empty() {
            map.roles.insert(DimRole::Y, dims[0].clone());
            map.roles.insert(DimRole::X, dims[1].clone());
        }
        map
    }

    /// The actual dimension name assigned to a role.
    #[must_use]
    pub fn get(&self, role: DimRole) -> Option<&str> {
        self.roles.get(&role).map(String::as_str)
    }

    /// The role assigned to an actual dimension name.
    #[must_use]
    pub fn role_of(&self, dim: &str) -> Option<DimRole> {
        self.roles
            .iter()
            .find_map(|(role, assigned)| (assigned == dim).then_some(*role))
    }

    /// Assign a role to a dimension, displacing any previous assignment of
    /// either the role or the dimension.
    pub fn assign(&mut self, role: DimRole, dim: impl Into<String>) {
        let dim = dim.into();
        self.roles.retain(|_, assigned| *assigned != dim);
        self.roles.insert(role, dim);
    }

    /// Substitute preferred role names into a dimension list, leaving
    /// unassigned dimensions unchanged.
    #[must_use]
    pub fn apply(&self, dims: &[String]) -> Vec<String> {
        dims.iter()
            .map(|dim| {
                self.role_of(dim)
                    .map_or_else(|| dim.clone(), |role| role.to_string())
            })
            .collect()
    }

    /// The renames needed to give every assigned dimension its preferred
    /// role name.
    ///
    /// A rename may target an existing dimension or coordinate name as long
    /// as that name is itself renamed away, so transposed objects like
    /// `["x", "y"]` with swapped assignments still work. Any other collision
    /// is an error, never a silent overwrite.
    pub(crate) fn rename_plan(
        &self,
        dims: &[String],
        coordinates: &[String],
    ) -> Result<BTreeMap<String, String>, RenameCollisionError> {
        let mut renames = BTreeMap::new();
        for (role, actual) in &self.roles {
            let preferred = role.to_string();
            if *actual != preferred {
                renames.insert(actual.clone(), preferred);
            }
        }
        for (from, to) in &renames {
            if renames.contains_key(to) {
                continue;
            }
            if dims.iter().any(|dim| dim == to) {
                return Err(RenameCollisionError::Dimension {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            if coordinates.iter().any(|name| name == to) {
                return Err(RenameCollisionError::Coordinate {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
        Ok(renames)
    }
}
