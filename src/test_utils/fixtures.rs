//! Sample mapper files for tests
//!
//! Each fixture carries the mapper name it is normally written under and its
//! XML content.

/// Test fixture for creating sample mapper files
#[derive(Clone, Debug)]
pub struct MapperFixture {
    pub name: String,
    pub content: String,
}

impl MapperFixture {
    /// One statement of each kind over a `users` table
    pub fn users() -> Self {
        Self {
            name: "users".to_string(),
            content: r#"
<mapper>
  <select id="findUser">SELECT * FROM users WHERE name = #{name} AND age = #{age}</select>
  <insert id="addUser">INSERT INTO users (name, age) VALUES (#{name}, #{age})</insert>
  <update id="renameUser">UPDATE users SET name = #{name} WHERE id = #{id}</update>
  <delete id="removeUser">DELETE FROM users WHERE id = #{id}</delete>
</mapper>
"#
            .trim()
            .to_string(),
        }
    }

    /// Same id declared twice as `select`, once as `delete`
    pub fn duplicates() -> Self {
        Self {
            name: "dupes".to_string(),
            content: r#"
<mapper>
  <select id="x">SELECT 1</select>
  <select id="x">SELECT 2</select>
  <delete id="x">DELETE FROM t</delete>
</mapper>
"#
            .trim()
            .to_string(),
        }
    }

    /// Unclosed statement element
    pub fn malformed() -> Self {
        Self {
            name: "broken".to_string(),
            content: r#"<mapper><select id="findUser">SELECT 1</mapper>"#.to_string(),
        }
    }

    /// Root element with no statements
    pub fn empty() -> Self {
        Self {
            name: "empty".to_string(),
            content: "<mapper/>".to_string(),
        }
    }

    /// Same fixture written under another mapper name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
