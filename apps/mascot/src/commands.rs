use anyhow::{anyhow, bail, Context};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Random,
    Index(usize, Option<usize>),
    Name(String, Option<usize>),
    Clothes,
    Reload,
    Resize(u32, u32),
    Copy,
    Return,
    Say(String),
    Sleep,
    Wake,
    Quit,
}

fn number<T: std::str::FromStr>(raw: Option<&str>, what: &str) -> anyhow::Result<T> {
    let raw = raw.ok_or_else(|| anyhow!("missing {what}"))?;
    raw.parse()
        .map_err(|_| anyhow!("invalid {what}: '{raw}'"))
}

fn optional_number(raw: Option<&str>) -> anyhow::Result<Option<usize>> {
    raw.map(|raw| number(Some(raw), "clothes index")).transpose()
}

impl Command {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        let command = match verb {
            "next" => Self::Next,
            "random" => Self::Random,
            "index" => Self::Index(
                number(args.next(), "model index")?,
                optional_number(args.next())?,
            ),
            "name" => {
                let name = args.next().context("missing model name")?;
                Self::Name(name.to_string(), optional_number(args.next())?)
            }
            "clothes" => Self::Clothes,
            "reload" => Self::Reload,
            "resize" => Self::Resize(number(args.next(), "width")?, number(args.next(), "height")?),
            "copy" => Self::Copy,
            "return" => Self::Return,
            "say" if !rest.is_empty() => Self::Say(rest.to_string()),
            "say" => bail!("missing text"),
            "sleep" => Self::Sleep,
            "wake" => Self::Wake,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command '{other}'"),
        };
        Ok(command)
    }
}
