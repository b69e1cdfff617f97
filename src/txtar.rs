//! Minimal txtar archives.
//!
//! The playground stores multi-file programs as a single text blob:
//!
//! ```text
//! optional comment
//! -- go.mod --
//! module example
//! -- main.go --
//! package main
//! ```
//!
//! A marker line starts with `-- `, ends with ` --` and names the file whose
//! content follows, up to the next marker.

/// One archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    /// Text before the first marker.
    pub comment: Vec<u8>,
    pub files: Vec<File>,
}

impl Archive {
    /// Serialize, giving the comment and every non-empty member a final
    /// newline so the next marker starts on its own line.
    pub fn format(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_with_newline(&mut out, &self.comment);
        for file in &self.files {
            out.extend_from_slice(format!("-- {} --\n", file.name).as_bytes());
            push_with_newline(&mut out, &file.data);
        }
        out
    }

    /// Parse `data`. Never fails: text without markers is all comment.
    pub fn parse(data: &[u8]) -> Archive {
        let (comment, mut next, mut rest) = split_at_marker(data);
        let mut archive = Archive {
            comment: comment.to_vec(),
            files: Vec::new(),
        };
        while let Some(name) = next {
            let (body, following, after) = split_at_marker(rest);
            archive.files.push(File {
                name,
                data: body.to_vec(),
            });
            next = following;
            rest = after;
        }
        archive
    }
}

fn push_with_newline(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
    if !data.is_empty() && !data.ends_with(b"\n") {
        out.push(b'\n');
    }
}

/// Split at the first marker line: text before it, its name, text after it.
fn split_at_marker(data: &[u8]) -> (&[u8], Option<String>, &[u8]) {
    let mut start = 0;
    loop {
        if let Some((name, after)) = marker(&data[start..]) {
            return (&data[..start], Some(name), after);
        }
        match data[start..].iter().position(|&b| b == b'\n') {
            Some(offset) => start += offset + 1,
            None => return (data, None, &data[data.len()..]),
        }
    }
}

fn marker(line_start: &[u8]) -> Option<(String, &[u8])> {
    if !line_start.starts_with(b"-- ") {
        return None;
    }
    let (line, after) = match line_start.iter().position(|&b| b == b'\n') {
        Some(end) => (&line_start[..end], &line_start[end + 1..]),
        None => (line_start, &line_start[line_start.len()..]),
    };
    if line.len() < 6 || !line.ends_with(b" --") {
        return None;
    }
    let name = String::from_utf8_lossy(&line[3..line.len() - 3])
        .trim()
        .to_string();
    if name.is_empty() {
        None
    } else {
        Some((name, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comment_and_files() {
        let text = b"a comment\n-- go.mod --\nmodule example\n-- main.go --\npackage main\n";
        let archive = Archive::parse(text);
        assert_eq!(archive.comment, b"a comment\n");
        assert_eq!(archive.files.len(), 2);
        assert_eq!(archive.files[0].name, "go.mod");
        assert_eq!(archive.files[0].data, b"module example\n");
        assert_eq!(archive.files[1].name, "main.go");
        assert_eq!(archive.files[1].data, b"package main\n");
    }

    #[test]
    fn plain_program_is_all_comment() {
        let text = b"package main\n\nfunc main() { println(\"-- x --\") }\n";
        let archive = Archive::parse(text);
        assert!(archive.files.is_empty());
        assert_eq!(archive.comment, text);
    }

    #[test]
    fn empty_marker_name_is_not_a_marker() {
        let archive = Archive::parse(b"--  --\nbody\n");
        assert!(archive.files.is_empty());
    }

    #[test]
    fn format_then_parse_keeps_members() {
        let archive = Archive {
            comment: Vec::new(),
            files: vec![
                File {
                    name: "a.go".into(),
                    data: b"package a".to_vec(),
                },
                File {
                    name: "dir/b.go".into(),
                    data: b"package b\n".to_vec(),
                },
            ],
        };
        let text = archive.format();
        assert_eq!(
            text,
            b"-- a.go --\npackage a\n-- dir/b.go --\npackage b\n".to_vec()
        );

        let parsed = Archive::parse(&text);
        assert_eq!(parsed.files[0].data, b"package a\n");
        assert_eq!(parsed.files[1].name, "dir/b.go");
    }

    #[test]
    fn carriage_return_ends_no_marker() {
        let data = b"-- main.go --\r\npackage main\r\n";
        let archive = Archive::parse(data);
        assert!(archive.files.is_empty());
        assert_eq!(archive.comment, data);
    }
}
