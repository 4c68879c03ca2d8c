//! HTML and URL escaping.

/// Append `text` to `ob` with the HTML special characters escaped.
pub fn escape_html(ob: &mut Vec<u8>, text: &[u8]) {
    let mut start = 0;
    for (i, &c) in text.iter().enumerate() {
        let rep: &[u8] = match c {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'"' => b"&quot;",
            b'\'' => b"&#39;",
            _ => continue,
        };
        ob.extend_from_slice(&text[start..i]);
        ob.extend_from_slice(rep);
        start = i + 1;
    }
    ob.extend_from_slice(&text[start..]);
}

/// Bytes that pass through an `href` unchanged.
fn is_href_safe(c: u8) -> bool {
    c.is_ascii_alphanumeric() || b"-_.+!*(),%#@?=;:/$~[]".contains(&c)
}

/// Append `link` to `ob` as a double-quoted attribute value.
///
/// Existing `%XX` escapes are kept. Other unsafe bytes are percent-encoded,
/// except `&` and `'` which become entities.
pub fn escape_href(ob: &mut Vec<u8>, link: &[u8]) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    for &c in link {
        match c {
            c if is_href_safe(c) => ob.push(c),
            b'&' => ob.extend_from_slice(b"&amp;"),
            b'\'' => ob.extend_from_slice(b"&#x27;"),
            c => {
                ob.push(b'%');
                ob.push(HEX[(c >> 4) as usize]);
                ob.push(HEX[(c & 0xf) as usize]);
            }
        }
    }
}
