use std::borrow::Cow;

/**
A `WordTokenizer` splits text into tokens of adjacent word characters, where a word character is any alphanumeric character or an underscore. Tokens must be at least two characters long. When `lowercase` is set, tokens containing uppercase letters are lowercased.

# Example

| text          | tokens                 |
|---------------|------------------------|
| Don't         | ["don"]                |
| $50           | ["50"]                 |
| 50(hello)     | ["50", "hello"]        |
| snake_case it | ["snake_case", "it"]   |
| C.E.O.        | []                     |
*/
#[derive(Clone, Debug)]
pub struct WordTokenizer<'a> {
	text: &'a str,
	byte_index: usize,
	lowercase: bool,
}

impl<'a> WordTokenizer<'a> {
	pub fn new(text: &'a str, lowercase: bool) -> Self {
		Self {
			text,
			byte_index: 0,
			lowercase,
		}
	}
}

fn is_word_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_'
}

impl<'a> Iterator for WordTokenizer<'a> {
	type Item = Cow<'a, str>;
	fn next(&mut self) -> Option<Self::Item> {
		// Find the next pair of adjacent word chars.
		loop {
			let next_char = self.text[self.byte_index..].chars().next()?;
			let next_next_char = self.text[self.byte_index + next_char.len_utf8()..]
				.chars()
				.next()?;
			if is_word_char(next_char) && is_word_char(next_next_char) {
				break;
			} else {
				self.byte_index += next_char.len_utf8();
			}
		}
		let start = self.byte_index;
		let mut contains_capital_letter = false;
		while let Some(next_char) = self.text[self.byte_index..].chars().next() {
			if !is_word_char(next_char) {
				break;
			}
			if next_char.is_uppercase() {
				contains_capital_letter = true;
			}
			self.byte_index += next_char.len_utf8();
		}
		let token = &self.text[start..self.byte_index];
		let token = if self.lowercase && contains_capital_letter {
			Cow::Owned(token.to_lowercase())
		} else {
			Cow::Borrowed(token)
		};
		Some(token)
	}
}

#[test]
fn test_word_tokenizer() {
	fn test(text: &str, tokens: &[&str]) {
		assert!(WordTokenizer::new(text, true).eq(tokens.iter().cloned()));
	}
	test("Don't", &["don"]);
	test("CEO/Co-founder", &["ceo", "co", "founder"]);
	test("$50", &["50"]);
	test("50_hello", &["50_hello"]);
	test("50(hello)", &["50", "hello"]);
	test("C.E.O", &[]);
	test("a bc d", &["bc"]);
	test("", &[]);
	test("Über straße", &["über", "straße"]);
}

#[test]
fn test_word_tokenizer_preserves_case() {
	let tokens: Vec<_> = WordTokenizer::new("Deep Learning", false).collect();
	assert_eq!(tokens, vec!["Deep", "Learning"]);
}
