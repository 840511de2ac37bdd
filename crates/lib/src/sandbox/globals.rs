//! The allow-list environment scripts run in.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Timelike, Utc};
use mlua::prelude::*;
use serde_json::Value as JsonValue;

use crate::consts::{CONSOLE_TRUNCATED, MAX_CONSOLE_BYTES, MAX_CONSOLE_LINES};
use crate::context::ExecutionContext;
use crate::sandbox::convert::{json_to_lua_value, lua_value_to_json};

/// Base functions copied from the host state.
const PRIMITIVES: &[&str] = &[
  "tostring", "tonumber", "type", "pairs", "ipairs", "next", "select", "error", "pcall", "assert",
];

const LIBRARIES: &[&str] = &["math", "table", "utf8"];

const STRICT_ENV: &str = r#"
local env = ...
setmetatable(env, {
  __index = function(_, name)
    error("undefined variable '" .. tostring(name) .. "'", 2)
  end,
})
"#;

#[derive(Debug, Default)]
struct Captured {
  lines: Vec<String>,
  bytes: usize,
  truncated: bool,
}

impl Captured {
  fn push(&mut self, line: String) {
    if self.truncated {
      return;
    }
    if self.lines.len() >= MAX_CONSOLE_LINES || self.bytes + line.len() > MAX_CONSOLE_BYTES {
      self.truncated = true;
      self.lines.push(CONSOLE_TRUNCATED.to_string());
      return;
    }
    self.bytes += line.len();
    self.lines.push(line);
  }
}

/// Lines written through `print` and `console.*`, capped at
/// [`MAX_CONSOLE_LINES`] lines and [`MAX_CONSOLE_BYTES`] bytes.
#[derive(Debug, Clone, Default)]
pub struct Console {
  captured: Rc<RefCell<Captured>>,
}

impl Console {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lines(&self) -> Vec<String> {
    self.captured.borrow().lines.clone()
  }

  fn writer(&self, lua: &Lua, separator: &'static str, prefix: Option<&'static str>) -> LuaResult<LuaFunction> {
    let captured = Rc::clone(&self.captured);
    lua.create_function(move |_, args: LuaMultiValue| {
      if captured.borrow().truncated {
        return Ok(());
      }
      let parts = args.iter().map(|v| v.to_string()).collect::<LuaResult<Vec<_>>>()?;
      let text = parts.join(separator);
      let line = match prefix {
        Some(prefix) => format!("[{}] {}", prefix, text),
        None => text,
      };
      captured.borrow_mut().push(line);
      Ok(())
    })
  }

  fn table(&self, lua: &Lua) -> LuaResult<LuaTable> {
    let console = lua.create_table()?;
    console.set("log", self.writer(lua, " ", None)?)?;
    console.set("info", self.writer(lua, " ", None)?)?;
    console.set("warn", self.writer(lua, " ", Some("warn"))?)?;
    console.set("error", self.writer(lua, " ", Some("error"))?)?;
    Ok(console)
  }
}

/// Build a fresh environment table for one chunk.
///
/// Context variables are bound last and shadow built-ins of the same name.
/// Reading a name that is not bound raises `undefined variable '<name>'`.
pub fn build_environment(lua: &Lua, console: &Console, context: &ExecutionContext) -> LuaResult<LuaTable> {
  let globals = lua.globals();
  let env = lua.create_table()?;

  for name in PRIMITIVES.iter().chain(LIBRARIES) {
    env.set(*name, globals.get::<LuaValue>(*name)?)?;
  }

  let string: LuaTable = globals.get("string")?;
  string.set("dump", LuaNil)?;
  env.set("string", string)?;

  let table: LuaTable = globals.get("table")?;
  env.set("unpack", table.get::<LuaValue>("unpack")?)?;

  env.set("os", os_table(lua)?)?;
  env.set("json", json_table(lua)?)?;
  env.set("print", console.writer(lua, "\t", None)?)?;
  env.set("console", console.table(lua)?)?;

  for (name, value) in context.variables() {
    env.set(name, json_to_lua_value(lua, &value)?)?;
  }

  lua.load(STRICT_ENV).set_name("=strict").call::<()>(env.clone())?;
  Ok(env)
}

fn json_table(lua: &Lua) -> LuaResult<LuaTable> {
  let json = lua.create_table()?;
  json.set(
    "encode",
    lua.create_function(|_, value: LuaValue| {
      let value = lua_value_to_json(value)?;
      serde_json::to_string(&value).map_err(LuaError::external)
    })?,
  )?;
  json.set(
    "decode",
    lua.create_function(|lua, text: String| {
      let value: JsonValue = serde_json::from_str(&text).map_err(LuaError::external)?;
      json_to_lua_value(lua, &value)
    })?,
  )?;
  Ok(json)
}

fn os_table(lua: &Lua) -> LuaResult<LuaTable> {
  let os = lua.create_table()?;
  let started = Instant::now();
  os.set("clock", lua.create_function(move |_, ()| Ok(started.elapsed().as_secs_f64()))?)?;
  os.set("time", lua.create_function(|_, spec: Option<LuaTable>| os_time(spec))?)?;
  os.set(
    "date",
    lua.create_function(|lua, (format, time): (Option<String>, Option<i64>)| os_date(lua, format, time))?,
  )?;
  Ok(os)
}

fn os_time(spec: Option<LuaTable>) -> LuaResult<i64> {
  let Some(spec) = spec else {
    return Ok(Utc::now().timestamp());
  };

  let field = |name: &str, default: Option<i64>| -> LuaResult<i64> {
    match spec.get::<Option<i64>>(name)? {
      Some(value) => Ok(value),
      None => default.ok_or_else(|| LuaError::runtime(format!("field '{}' missing in date table", name))),
    }
  };
  let (year, month, day) = (field("year", None)?, field("month", None)?, field("day", None)?);
  let (hour, min, sec) = (field("hour", Some(12))?, field("min", Some(0))?, field("sec", Some(0))?);

  let naive = i32::try_from(year)
    .ok()
    .zip(u32::try_from(month).ok())
    .zip(u32::try_from(day).ok())
    .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
    .zip(u32::try_from(hour).ok())
    .zip(u32::try_from(min).ok())
    .zip(u32::try_from(sec).ok())
    .and_then(|(((date, h), m), s)| date.and_hms_opt(h, m, s))
    .ok_or_else(|| LuaError::runtime("date table out of range"))?;

  Local
    .from_local_datetime(&naive)
    .earliest()
    .map(|moment| moment.timestamp())
    .ok_or_else(|| LuaError::runtime("date table does not name a local time"))
}

fn os_date(lua: &Lua, format: Option<String>, time: Option<i64>) -> LuaResult<LuaValue> {
  let format = format.unwrap_or_else(|| "%c".to_string());
  let (utc, format) = match format.strip_prefix('!') {
    Some(rest) => (true, rest),
    None => (false, format.as_str()),
  };
  let stamp = time.unwrap_or_else(|| Utc::now().timestamp());
  let moment = DateTime::from_timestamp(stamp, 0).ok_or_else(|| LuaError::runtime("time out of range"))?;

  if utc {
    render_date(lua, format, moment)
  } else {
    render_date(lua, format, moment.with_timezone(&Local))
  }
}

fn render_date<Tz>(lua: &Lua, format: &str, moment: DateTime<Tz>) -> LuaResult<LuaValue>
where
  Tz: TimeZone,
  Tz::Offset: fmt::Display,
{
  if format.starts_with("*t") {
    let fields = lua.create_table()?;
    fields.set("year", moment.year())?;
    fields.set("month", moment.month())?;
    fields.set("day", moment.day())?;
    fields.set("hour", moment.hour())?;
    fields.set("min", moment.minute())?;
    fields.set("sec", moment.second())?;
    fields.set("wday", moment.weekday().number_from_sunday())?;
    fields.set("yday", moment.ordinal())?;
    fields.set("isdst", false)?;
    return Ok(LuaValue::Table(fields));
  }

  if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
    return Err(LuaError::runtime(format!("invalid conversion specifier in '{}'", format)));
  }
  Ok(LuaValue::String(lua.create_string(moment.format(format).to_string())?))
}
