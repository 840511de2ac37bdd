//! Conversions between JSON values and Lua values.

use mlua::prelude::*;
use serde_json::Value as JsonValue;

/// Largest magnitude below which an integral float is handed to Lua as an integer.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Tables nested deeper than this (including self-referencing ones) are refused.
const MAX_NESTING: usize = 128;

/// Convert a Lua value to a serde_json::Value.
///
/// A table becomes an array only when its keys are exactly `1..=n`; sparse or
/// mixed tables become objects.
pub fn lua_value_to_json(value: LuaValue) -> LuaResult<JsonValue> {
  to_json(value, 0)
}

fn to_json(value: LuaValue, depth: usize) -> LuaResult<JsonValue> {
  match value {
    LuaValue::Nil => Ok(JsonValue::Null),
    LuaValue::Boolean(b) => Ok(JsonValue::Bool(b)),
    LuaValue::Integer(i) => Ok(JsonValue::Number(i.into())),
    LuaValue::Number(n) => {
      if n.is_finite() {
        Ok(serde_json::Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number))
      } else {
        Err(LuaError::external("cannot encode NaN or infinity as JSON"))
      }
    }
    LuaValue::String(s) => Ok(JsonValue::String(s.to_str()?.to_string())),
    LuaValue::Table(t) => {
      if depth >= MAX_NESTING {
        return Err(LuaError::external("cannot encode tables nested this deeply (or containing themselves) as JSON"));
      }
      table_to_json(t, depth + 1)
    }
    LuaValue::Function(_) => Err(LuaError::external("cannot encode a function as JSON")),
    LuaValue::Thread(_) => Err(LuaError::external("cannot encode a thread as JSON")),
    LuaValue::UserData(_) | LuaValue::LightUserData(_) => Err(LuaError::external("cannot encode userdata as JSON")),
    LuaValue::Error(e) => Err(LuaError::external(format!("cannot encode an error as JSON: {}", e))),
    _ => Err(LuaError::external("unsupported value type")),
  }
}

fn table_to_json(t: LuaTable, depth: usize) -> LuaResult<JsonValue> {
  let mut count = 0usize;
  let mut max_index = 0i64;
  let mut integer_keys = true;
  for pair in t.clone().pairs::<LuaValue, LuaValue>() {
    let (k, _) = pair?;
    count += 1;
    match k {
      LuaValue::Integer(i) if i > 0 => max_index = max_index.max(i),
      _ => integer_keys = false,
    }
  }

  // Every key from 1 to `count` is present exactly when the largest equals the count.
  if integer_keys && count > 0 && usize::try_from(max_index).is_ok_and(|max| max == count) {
    let mut arr = Vec::with_capacity(count);
    for value in t.sequence_values::<LuaValue>() {
      arr.push(to_json(value?, depth)?);
    }
    return Ok(JsonValue::Array(arr));
  }

  let mut map = serde_json::Map::new();
  for pair in t.pairs::<LuaValue, LuaValue>() {
    let (k, v) = pair?;
    let key = match k {
      LuaValue::String(s) => s.to_str()?.to_string(),
      LuaValue::Integer(i) => i.to_string(),
      LuaValue::Number(n) => n.to_string(),
      other => {
        return Err(LuaError::external(format!(
          "cannot encode a table with {} keys as JSON",
          other.type_name()
        )));
      }
    };
    map.insert(key, to_json(v, depth)?);
  }
  Ok(JsonValue::Object(map))
}

/// Convert a JSON value to a Lua value.
///
/// Integral numbers become Lua integers so string concatenation in scripts
/// prints `10` rather than `10.0`.
pub fn json_to_lua_value(lua: &Lua, value: &JsonValue) -> LuaResult<LuaValue> {
  match value {
    JsonValue::Null => Ok(LuaValue::Nil),
    JsonValue::Bool(b) => Ok(LuaValue::Boolean(*b)),
    JsonValue::Number(n) => {
      if let Some(i) = n.as_i64() {
        Ok(LuaValue::Integer(i))
      } else if let Some(f) = n.as_f64() {
        if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT {
          Ok(LuaValue::Integer(f as i64))
        } else {
          Ok(LuaValue::Number(f))
        }
      } else {
        Err(LuaError::external("invalid number"))
      }
    }
    JsonValue::String(s) => Ok(LuaValue::String(lua.create_string(s)?)),
    JsonValue::Array(arr) => {
      let table = lua.create_table()?;
      for (i, v) in arr.iter().enumerate() {
        table.set(i + 1, json_to_lua_value(lua, v)?)?;
      }
      Ok(LuaValue::Table(table))
    }
    JsonValue::Object(obj) => {
      let table = lua.create_table()?;
      for (k, v) in obj {
        table.set(k.as_str(), json_to_lua_value(lua, v)?)?;
      }
      Ok(LuaValue::Table(table))
    }
  }
}
